//! Transaction inquiry: look up the result of a payment attempt.

// self
use crate::{
	_prelude::*,
	gateway::{Gateway, GatewayTimestamp, lenient_string},
	http::GatewayHttpClient,
	merchant::{GatewayEndpoints, InvoiceNumber, MerchantCode, TerminalCode, TransactionReference},
	obs::OperationKind,
	sign::Payload,
};

/// Identifies the payment attempt to look up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionQuery {
	/// Reference the gateway appended to the redirect address (`tref`).
	pub transaction_reference: TransactionReference,
	/// Merchant-side invoice number.
	pub invoice_number: InvoiceNumber,
	/// Invoice issue time.
	pub invoice_date: GatewayTimestamp,
}
impl TransactionQuery {
	/// Creates a query.
	pub fn new(
		transaction_reference: TransactionReference,
		invoice_number: InvoiceNumber,
		invoice_date: GatewayTimestamp,
	) -> Self {
		Self { transaction_reference, invoice_number, invoice_date }
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckTransactionBody<'a> {
	#[serde(rename = "transactionReferenceID")]
	transaction_reference_id: &'a TransactionReference,
	invoice_number: &'a InvoiceNumber,
	invoice_date: GatewayTimestamp,
	merchant_code: &'a MerchantCode,
	terminal_code: &'a TerminalCode,
}

/// `CheckTransactionResult` response body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactionStatus {
	/// Shaparak trace number.
	#[serde(default, deserialize_with = "lenient_string")]
	pub trace_number: Option<String>,
	/// Bank reference number.
	#[serde(default, deserialize_with = "lenient_string")]
	pub reference_number: Option<String>,
	/// When the transaction happened, as reported by the gateway.
	pub transaction_date: Option<String>,
	/// Action code of the transaction.
	#[serde(default, deserialize_with = "lenient_string")]
	pub action: Option<String>,
	/// Gateway transaction reference.
	#[serde(rename = "TransactionReferenceID", default, deserialize_with = "lenient_string")]
	pub transaction_reference_id: Option<String>,
	/// Merchant-side invoice number.
	#[serde(default, deserialize_with = "lenient_string")]
	pub invoice_number: Option<String>,
	/// Invoice issue time.
	pub invoice_date: Option<String>,
	/// Merchant code.
	#[serde(default, deserialize_with = "lenient_string")]
	pub merchant_code: Option<String>,
	/// Terminal code.
	#[serde(default, deserialize_with = "lenient_string")]
	pub terminal_code: Option<String>,
	/// Transaction amount.
	#[serde(default, deserialize_with = "lenient_string")]
	pub amount: Option<String>,
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
	/// Looks up the outcome of a payment attempt.
	pub async fn check_transaction(&self, query: &TransactionQuery) -> Result<TransactionStatus> {
		let profile = self.profile();
		let body = CheckTransactionBody {
			transaction_reference_id: &query.transaction_reference,
			invoice_number: &query.invoice_number,
			invoice_date: query.invoice_date,
			merchant_code: &profile.merchant_code,
			terminal_code: &profile.terminal_code,
		};
		let payload = Payload::from_serializable(&body)?;

		self.call(OperationKind::CheckTransaction, GatewayEndpoints::CHECK_TRANSACTION, payload)
			.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[tokio::test]
	async fn check_transaction_posts_camel_case_body_and_reads_status() {
		let client = RecordingHttpClient::default().respond(
			200,
			r#"{"IsSuccess":true,"Message":"done","TraceNumber":13,"ReferenceNumber":"100200300",
			"TransactionDate":"2024/01/01 10:01:00","Action":"1003","TransactionReferenceID":"636f2d",
			"InvoiceNumber":"A1","InvoiceDate":"2024/01/01 10:00:00","MerchantCode":4512345,
			"TerminalCode":1653000,"Amount":1000.0,"CardNumber":"6221****1234"}"#,
		);
		let gateway = build_recording_gateway("https://pep.example.test/", client);
		let query = TransactionQuery::new(
			TransactionReference::new("636f2d").expect("Reference should be valid."),
			InvoiceNumber::new("A1").expect("Invoice number should be valid."),
			GatewayTimestamp::parse("2024/01/01 10:00:00").expect("Timestamp should parse."),
		);
		let status = gateway.check_transaction(&query).await.expect("Inquiry should succeed.");

		assert_eq!(status.trace_number.as_deref(), Some("13"));
		assert_eq!(status.merchant_code.as_deref(), Some("4512345"));
		assert_eq!(status.amount.as_deref(), Some("1000.0"));
		assert_eq!(status.transaction_reference_id.as_deref(), Some("636f2d"));
		assert_eq!(status.message.as_deref(), Some("done"));
		assert_eq!(
			status.extra.get("CardNumber").and_then(|value| value.as_str()),
			Some("6221****1234")
		);

		let requests = gateway.http_client.requests();

		assert_eq!(
			requests[0].url.as_str(),
			"https://pep.example.test/Api/v1/Payment/CheckTransactionResult"
		);
		assert_eq!(
			String::from_utf8_lossy(requests[0].body()),
			"{\"invoiceDate\":\"2024/01/01 10:00:00\",\"invoiceNumber\":\"A1\",\
			\"merchantCode\":\"4512345\",\"terminalCode\":\"1653000\",\
			\"transactionReferenceID\":\"636f2d\"}"
		);
	}
}
