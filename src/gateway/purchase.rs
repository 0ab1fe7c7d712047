//! Purchase: obtain a payment token and the URL that sends the customer to pay.

// self
use crate::{
	_prelude::*,
	error::ResponseError,
	gateway::{Gateway, GatewayTimestamp},
	http::GatewayHttpClient,
	merchant::{GatewayEndpoints, InvoiceNumber, MerchantCode, TerminalCode},
	obs::OperationKind,
	sign::Payload,
};

/// Action code the gateway uses for purchases.
pub const ACTION_PURCHASE: &str = "1003";

/// Invoice to be paid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseRequest {
	/// Amount in Rials.
	pub amount: u64,
	/// Merchant-side invoice number.
	pub invoice_number: InvoiceNumber,
	/// Invoice issue time.
	pub invoice_date: GatewayTimestamp,
	/// Payer's mobile number, if known.
	pub mobile: Option<String>,
	/// Payer's email address, if known.
	pub email: Option<String>,
}
impl PurchaseRequest {
	/// Creates a request without payer contact details.
	pub fn new(amount: u64, invoice_number: InvoiceNumber, invoice_date: GatewayTimestamp) -> Self {
		Self { amount, invoice_number, invoice_date, mobile: None, email: None }
	}

	/// Sets the payer's mobile number.
	pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
		self.mobile = Some(mobile.into());

		self
	}

	/// Sets the payer's email address.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetTokenBody<'a> {
	amount: String,
	invoice_number: &'a InvoiceNumber,
	invoice_date: GatewayTimestamp,
	mobile: &'a str,
	email: &'a str,
	action: &'static str,
	merchant_code: &'a MerchantCode,
	terminal_code: &'a TerminalCode,
	redirect_address: &'a Url,
	time_stamp: GatewayTimestamp,
}

/// `GetToken` response body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenResponse {
	/// Payment token.
	pub token: Option<String>,
	/// Gateway message.
	pub message: Option<String>,
	/// Fields this client does not model.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

/// Where to send the customer to complete a purchase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRedirect {
	/// Payment token issued by the gateway.
	pub token: String,
	/// Payment page URL carrying the token.
	pub url: Url,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Requests a payment token for `request` and builds the payment page URL.
	pub async fn purchase(&self, request: &PurchaseRequest) -> Result<PaymentRedirect> {
		let profile = self.profile();
		let body = GetTokenBody {
			amount: request.amount.to_string(),
			invoice_number: &request.invoice_number,
			invoice_date: request.invoice_date,
			mobile: request.mobile.as_deref().unwrap_or_default(),
			email: request.email.as_deref().unwrap_or_default(),
			action: ACTION_PURCHASE,
			merchant_code: &profile.merchant_code,
			terminal_code: &profile.terminal_code,
			redirect_address: &profile.redirect_address,
			time_stamp: self.clock().now(),
		};
		let payload = Payload::from_serializable(&body)?;
		let response: TokenResponse =
			self.call(OperationKind::Purchase, GatewayEndpoints::GET_TOKEN, payload).await?;
		let token = response
			.token
			.filter(|token| !token.is_empty())
			.ok_or(ResponseError::MissingField { field: "Token" })?;
		let url = profile.endpoints.payment_page(&token)?;

		Ok(PaymentRedirect { token, url })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::*,
		error::TransportError,
		gateway::GatewayClock,
		sign::SignatureToken,
	};

	const BASE: &str = "https://pep.example.test";

	fn stamp(value: &str) -> GatewayTimestamp {
		GatewayTimestamp::parse(value).expect("Timestamp fixture should parse.")
	}

	fn request() -> PurchaseRequest {
		PurchaseRequest::new(
			1000,
			InvoiceNumber::new("A1").expect("Invoice number should be valid."),
			stamp("2024/01/01 10:00:00"),
		)
		.with_mobile("09120000000")
	}

	#[tokio::test]
	async fn purchase_signs_canonical_body_and_builds_redirect() {
		let client = RecordingHttpClient::default()
			.respond(200, r#"{"IsSuccess":true,"Message":"ok","Token":"tok+en/1="}"#);
		let gateway = build_recording_gateway(BASE, client)
			.with_clock(GatewayClock::Fixed(stamp("2024/01/02 03:04:05")));
		let redirect = gateway.purchase(&request()).await.expect("Purchase should succeed.");

		assert_eq!(redirect.token, "tok+en/1=");
		assert_eq!(redirect.url.as_str(), "https://pep.example.test/payment.aspx?n=tok%2Ben%2F1%3D");

		let requests = gateway.http_client.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].url.as_str(), "https://pep.example.test/Api/v1/Payment/GetToken");
		assert_eq!(
			String::from_utf8_lossy(requests[0].body()),
			"{\"Action\":\"1003\",\"Amount\":\"1000\",\"Email\":\"\",\
			\"InvoiceDate\":\"2024/01/01 10:00:00\",\"InvoiceNumber\":\"A1\",\
			\"MerchantCode\":\"4512345\",\"Mobile\":\"09120000000\",\
			\"RedirectAddress\":\"https://shop.example.com/payment/callback\",\
			\"TerminalCode\":\"1653000\",\"TimeStamp\":\"2024/01/02 03:04:05\"}"
		);

		gateway
			.key()
			.public_key()
			.verify(requests[0].body(), &SignatureToken::from_base64(requests[0].token()))
			.expect("Sign header should verify against the transmitted body.");
	}

	#[tokio::test]
	async fn purchase_without_token_is_a_response_error() {
		let client = RecordingHttpClient::default().respond(200, r#"{"IsSuccess":true,"Token":""}"#);
		let gateway = build_recording_gateway(BASE, client);
		let err = gateway.purchase(&request()).await.expect_err("Empty token should fail.");

		assert!(matches!(err, Error::Response(ResponseError::MissingField { field: "Token" })));
	}

	#[tokio::test]
	async fn purchase_surfaces_rejections_and_transport_failures() {
		let client = RecordingHttpClient::default()
			.respond(400, r#"{"IsSuccess":false,"Message":"Invalid terminal"}"#);
		let gateway = build_recording_gateway(BASE, client);
		let err = gateway.purchase(&request()).await.expect_err("Rejected purchase should fail.");

		assert!(matches!(
			err,
			Error::Rejected { status: 400, ref message } if message == "Invalid terminal"
		));
		assert!(!err.is_fatal());

		let err = gateway.purchase(&request()).await.expect_err("No response should fail.");

		assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
		assert_eq!(gateway.http_client.requests().len(), 2);
	}
}
