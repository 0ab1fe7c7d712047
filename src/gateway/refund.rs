//! Refund of a settled invoice.

// self
use crate::{
	_prelude::*,
	gateway::{Gateway, GatewayTimestamp},
	http::GatewayHttpClient,
	merchant::{GatewayEndpoints, InvoiceNumber, MerchantCode, TerminalCode},
	obs::OperationKind,
	sign::Payload,
};

/// Invoice to refund.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefundRequest {
	/// Merchant-side invoice number.
	pub invoice_number: InvoiceNumber,
	/// Invoice issue time.
	pub invoice_date: GatewayTimestamp,
}
impl RefundRequest {
	/// Creates a refund request.
	pub fn new(invoice_number: InvoiceNumber, invoice_date: GatewayTimestamp) -> Self {
		Self { invoice_number, invoice_date }
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundPaymentBody<'a> {
	invoice_number: &'a InvoiceNumber,
	invoice_date: GatewayTimestamp,
	merchant_code: &'a MerchantCode,
	terminal_code: &'a TerminalCode,
	time_stamp: GatewayTimestamp,
}

/// `RefundPayment` response body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefundReceipt {
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
	/// Refunds a settled invoice.
	pub async fn refund(&self, request: &RefundRequest) -> Result<RefundReceipt> {
		let profile = self.profile();
		let body = RefundPaymentBody {
			invoice_number: &request.invoice_number,
			invoice_date: request.invoice_date,
			merchant_code: &profile.merchant_code,
			terminal_code: &profile.terminal_code,
			time_stamp: self.clock().now(),
		};
		let payload = Payload::from_serializable(&body)?;

		self.call(OperationKind::Refund, GatewayEndpoints::REFUND, payload).await
	}
}
