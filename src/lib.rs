//! Signed-request client for the Pasargad (PEP) payment gateway: rebuild the merchant's RSA
//! key from its XML export, sign canonical JSON bodies with PKCS#1 v1.5/SHA-1, and call the
//! purchase, inquiry, verification, and refund endpoints with typed requests.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod ext;
pub mod gateway;
pub mod http;
pub mod key;
pub mod merchant;
pub mod obs;
pub mod sign;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		path::PathBuf,
		sync::{Mutex, PoisonError},
	};
	// self
	use crate::{
		gateway::Gateway,
		http::{GatewayHttpClient, GatewayRequest, GatewayResponse, HttpFuture},
		key::{GatewayKey, KeyPolicy},
		merchant::{GatewayEndpoints, MerchantCode, MerchantProfile, TerminalCode},
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

	/// Gateway type alias used by fake-transport tests.
	pub type RecordingGateway = Gateway<RecordingHttpClient>;

	/// Absolute path of a file under `tests/fixtures`.
	pub fn fixture_path(name: &str) -> PathBuf {
		PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
	}

	/// Loads the 1024-bit fixture key with the default policy.
	pub fn fixture_key() -> GatewayKey {
		GatewayKey::load_with_policy(fixture_path("merchant_key.xml"), &KeyPolicy::default())
			.expect("Fixture key should load.")
	}

	/// Builds a profile that points at `base` and the fixture key.
	pub fn test_profile(base: &str) -> MerchantProfile {
		MerchantProfile::builder()
			.merchant_code(MerchantCode::new("4512345").expect("Merchant code should be valid."))
			.terminal_code(TerminalCode::new("1653000").expect("Terminal code should be valid."))
			.redirect_address(
				Url::parse("https://shop.example.com/payment/callback")
					.expect("Redirect fixture should parse."),
			)
			.key_file(fixture_path("merchant_key.xml"))
			.endpoints(GatewayEndpoints::new(
				Url::parse(base).expect("Base URL fixture should parse."),
			))
			.build()
			.expect("Test profile should be valid.")
	}

	/// Transport that records every request and answers with canned responses.
	#[derive(Debug, Default)]
	pub struct RecordingHttpClient {
		requests: Mutex<Vec<GatewayRequest>>,
		responses: Mutex<Vec<GatewayResponse>>,
	}
	impl RecordingHttpClient {
		/// Queues a response; responses are served in insertion order.
		pub fn respond(self, status: u16, body: &str) -> Self {
			self.responses
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.push(GatewayResponse { status, body: body.as_bytes().to_vec() });

			self
		}

		/// Requests received so far.
		pub fn requests(&self) -> Vec<GatewayRequest> {
			self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
		}
	}
	impl GatewayHttpClient for RecordingHttpClient {
		type TransportError = std::io::Error;

		fn post(&self, request: GatewayRequest) -> HttpFuture<'_, Self::TransportError> {
			self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);

			let next = {
				let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);

				if responses.is_empty() { None } else { Some(responses.remove(0)) }
			};

			Box::pin(async move {
				next.ok_or_else(|| {
					std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no canned response")
				})
			})
		}
	}

	/// Builds a gateway over `client` with the fixture key and a profile for `base`.
	pub fn build_recording_gateway(base: &str, client: RecordingHttpClient) -> RecordingGateway {
		Gateway::with_http_client(test_profile(base), fixture_key(), client)
			.expect("Recording gateway should build.")
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use color_eyre as _;
#[cfg(all(test, not(feature = "reqwest")))] use httpmock as _;
