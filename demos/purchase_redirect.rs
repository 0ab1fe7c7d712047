//! Demonstrates loading a merchant key from its XML export, requesting a payment token from
//! a mocked gateway, and printing the URL the customer should be redirected to.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use pep_gateway::{
	gateway::{Gateway, PurchaseRequest},
	http::ReqwestHttpClient,
	merchant::{GatewayEndpoints, InvoiceNumber, MerchantCode, MerchantProfile, TerminalCode},
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/Api/v1/Payment/GetToken").header_exists("sign");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"IsSuccess\":true,\"Message\":\"Token issued\",\"Token\":\"demo-token\"}");
		})
		.await;
	let profile = MerchantProfile::builder()
		.merchant_code(MerchantCode::new("4512345")?)
		.terminal_code(TerminalCode::new("1653000")?)
		.redirect_address(Url::parse("https://shop.example.com/payment/callback")?)
		.key_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/merchant_key.xml"))
		.endpoints(GatewayEndpoints::new(Url::parse(&server.base_url())?))
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(pep_gateway::reqwest::redirect::Policy::none())
			.build()?,
	);
	let gateway = Gateway::load(profile, http_client)?;
	let invoice_date = gateway.clock().now();
	let request = PurchaseRequest::new(150_000, InvoiceNumber::new("DEMO-0001")?, invoice_date)
		.with_email("buyer@example.com");
	let redirect = gateway.purchase(&request).await?;

	println!("Signed with {:?}.", gateway.key());
	println!("Invoice dated {invoice_date}.");
	println!("Redirect the customer to {}.", redirect.url);

	token_mock.assert_async().await;

	Ok(())
}
