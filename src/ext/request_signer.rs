//! Request signing contracts that attach gateway signatures to arbitrary HTTP clients.

// self
use crate::{_prelude::*, sign::SignedRequest};

/// Describes how to attach a [`SignedRequest`] to an outbound request without
/// constraining the HTTP client type.
///
/// Implementations must set both the body and the signature header from the same
/// [`SignedRequest`]; sending a body other than [`SignedRequest::body`] invalidates the
/// signature on the gateway side.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects the signed body and signature header.
	fn attach_signature(&self, request: Request, signed: &SignedRequest) -> Result<Request, Error>;
}

/// Header-based signer used by the gateway (`Sign: <base64>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignHeader {
	/// Header carrying the signature token.
	pub name: &'static str,
}
impl SignHeader {
	/// Header name the gateway reads.
	pub const DEFAULT_NAME: &'static str = "Sign";
}
impl Default for SignHeader {
	fn default() -> Self {
		Self { name: Self::DEFAULT_NAME }
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, ReqwestError> for SignHeader {
	fn attach_signature(
		&self,
		request: reqwest::RequestBuilder,
		signed: &SignedRequest,
	) -> Result<reqwest::RequestBuilder, ReqwestError> {
		Ok(request.header(self.name, signed.token().as_str()).body(signed.body().to_vec()))
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		key::{GatewayKey, KeyPolicy},
		sign::Payload,
	};

	#[test]
	fn reqwest_builder_carries_body_and_header() {
		let key = GatewayKey::from_xml(
			include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/merchant_key.xml")),
			&KeyPolicy::default(),
		)
		.expect("Fixture key should load.");
		let signed = key.sign(&Payload::new().with("Amount", "1000"));
		let request = SignHeader::default()
			.attach_signature(
				ReqwestClient::new().post("https://pep.shaparak.ir/Api/v1/Payment/GetToken"),
				&signed,
			)
			.expect("Attaching a signature should not fail.")
			.build()
			.expect("Signed request should build.");

		assert_eq!(
			request.headers().get("Sign").and_then(|value| value.to_str().ok()),
			Some(signed.token().as_str())
		);
		assert_eq!(request.body().and_then(|body| body.as_bytes()), Some(signed.body()));
	}
}
