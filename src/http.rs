//! Transport primitives for signed gateway calls.
//!
//! The module exposes [`GatewayHttpClient`] alongside [`GatewayRequest`] and
//! [`GatewayResponse`] so downstream crates can plug in their own HTTP stack. A transport
//! receives a request whose body and `Sign` header are already fixed by the signer; it
//! must send [`GatewayRequest::body`] byte-for-byte, because the gateway verifies the
//! signature over exactly those bytes.

// self
use crate::{_prelude::*, sign::SignedRequest};
#[cfg(feature = "reqwest")]
use crate::ext::{RequestSignerExt, SignHeader};
#[cfg(feature = "reqwest")]
use reqwest::header::{ACCEPT, CONTENT_TYPE};

/// Boxed future returned by [`GatewayHttpClient::post`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<GatewayResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of delivering signed gateway requests.
///
/// The trait is the client's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by many gateway handles, and
/// the returned future must be `Send` so calls can hop executors.
///
/// # Wire Contract
///
/// - Method `POST` to [`GatewayRequest::url`].
/// - Body exactly [`GatewayRequest::body`], `Content-Type: application/json`.
/// - Header [`SignHeader::DEFAULT_NAME`](crate::ext::SignHeader::DEFAULT_NAME) set to
///   [`GatewayRequest::token`].
/// - Any HTTP status is a response, not an error: the gateway answers failures with a JSON
///   envelope that the client still needs to read.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Sends `request` and returns the raw response.
	fn post(&self, request: GatewayRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Signed request ready for delivery.
#[derive(Clone, Debug)]
pub struct GatewayRequest {
	/// Absolute endpoint URL.
	pub url: Url,
	/// Canonical body and its signature.
	pub signed: SignedRequest,
}
impl GatewayRequest {
	/// Pairs an endpoint with a signed body.
	pub fn new(url: Url, signed: SignedRequest) -> Self {
		Self { url, signed }
	}

	/// Body bytes to transmit.
	pub fn body(&self) -> &[u8] {
		self.signed.body()
	}

	/// Value of the signature header.
	pub fn token(&self) -> &str {
		self.signed.token().as_str()
	}
}

/// Raw gateway response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GatewayResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body.
	pub body: Vec<u8>,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestHttpClient::new`] disables redirect following: a redirected POST would be
/// replayed without the signed body. Timeouts and retries belong to the wrapped client;
/// pass a configured one through [`ReqwestHttpClient::with_client`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client that does not follow redirects.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn post(&self, request: GatewayRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let builder = self
				.0
				.post(request.url.clone())
				.header(ACCEPT, "application/json")
				.header(CONTENT_TYPE, "application/json");
			let response =
				SignHeader::default().attach_signature(builder, &request.signed)?.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(GatewayResponse { status, body })
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::{_preludet::*, sign::Payload};

	#[tokio::test]
	async fn reqwest_client_posts_signed_body_and_keeps_error_bodies() {
		let server = MockServer::start_async().await;
		let signed = fixture_key().sign(&Payload::new().with("Amount", "1000"));
		let mock = server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/Api/v1/Payment/VerifyPayment")
					.header("content-type", "application/json")
					.header("sign", signed.token().as_str())
					.body("{\"Amount\":\"1000\"}");
				then.status(500).body("{\"IsSuccess\":false}");
			})
			.await;
		let url = Url::parse(&server.url("/Api/v1/Payment/VerifyPayment"))
			.expect("Mock endpoint should parse.");
		let response = test_reqwest_http_client()
			.post(GatewayRequest::new(url, signed))
			.await
			.expect("Transport should deliver the request.");

		mock.assert_async().await;

		assert_eq!(response, GatewayResponse { status: 500, body: b"{\"IsSuccess\":false}".to_vec() });
	}
}
