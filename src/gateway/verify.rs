//! Payment verification: confirm a paid invoice so the gateway settles it.

// self
use crate::{
	_prelude::*,
	gateway::{Gateway, GatewayTimestamp, lenient_string},
	http::GatewayHttpClient,
	merchant::{GatewayEndpoints, InvoiceNumber, MerchantCode, TerminalCode},
	obs::OperationKind,
	sign::Payload,
};

/// Invoice to confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyRequest {
	/// Amount in Rials; must match the purchase.
	pub amount: u64,
	/// Merchant-side invoice number.
	pub invoice_number: InvoiceNumber,
	/// Invoice issue time.
	pub invoice_date: GatewayTimestamp,
}
impl VerifyRequest {
	/// Creates a verification request.
	pub fn new(amount: u64, invoice_number: InvoiceNumber, invoice_date: GatewayTimestamp) -> Self {
		Self { amount, invoice_number, invoice_date }
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyPaymentBody<'a> {
	amount: String,
	invoice_number: &'a InvoiceNumber,
	invoice_date: GatewayTimestamp,
	merchant_code: &'a MerchantCode,
	terminal_code: &'a TerminalCode,
	time_stamp: GatewayTimestamp,
}

/// `VerifyPayment` response body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentVerification {
	/// Card number with the middle digits masked.
	pub masked_card_number: Option<String>,
	/// Hash of the card number.
	pub hashed_card_number: Option<String>,
	/// Shaparak reference number.
	#[serde(default, deserialize_with = "lenient_string")]
	pub shaparak_ref_number: Option<String>,
	/// Gateway message.
	pub message: Option<String>,
	/// Fields this client does not model.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Confirms a paid invoice.
	pub async fn verify_payment(&self, request: &VerifyRequest) -> Result<PaymentVerification> {
		let profile = self.profile();
		let body = VerifyPaymentBody {
			amount: request.amount.to_string(),
			invoice_number: &request.invoice_number,
			invoice_date: request.invoice_date,
			merchant_code: &profile.merchant_code,
			terminal_code: &profile.terminal_code,
			time_stamp: self.clock().now(),
		};
		let payload = Payload::from_serializable(&body)?;

		self.call(OperationKind::VerifyPayment, GatewayEndpoints::VERIFY_PAYMENT, payload).await
	}
}
