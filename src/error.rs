//! Client-level error types shared by key loading, signing, and gateway calls.

// self
use crate::{_prelude::*, key::KeyError, merchant::MerchantProfileError, sign::PayloadError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Merchant key could not be loaded; fatal for the client that owns it.
	#[error(transparent)]
	Key(#[from] KeyError),
	/// Request data could not be turned into a canonical payload.
	#[error(transparent)]
	Payload(#[from] PayloadError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Gateway answered with something other than the expected JSON envelope.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// Gateway processed the request and reported `IsSuccess = false`.
	#[error("Gateway rejected the request: {message}.")]
	Rejected {
		/// HTTP status code of the response.
		status: u16,
		/// Gateway-supplied message.
		message: String,
	},
}
impl Error {
	/// Whether the failure comes from local setup (key or configuration) rather than a call.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Key(_) | Self::Config(_))
	}
}
impl From<MerchantProfileError> for Error {
	fn from(e: MerchantProfileError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Merchant profile failed validation.
	#[error(transparent)]
	Profile(#[from] MerchantProfileError),
	/// Endpoint URL could not be derived from the configured base.
	#[error("Endpoint `{path}` cannot be joined to the gateway base URL.")]
	InvalidEndpoint {
		/// Relative endpoint path.
		path: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Gateway responses that could not be interpreted.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body is not the expected JSON document.
	#[error("Gateway returned malformed JSON (HTTP {status}).")]
	Parse {
		/// Structured parsing failure, including the failing field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// A successful envelope lacked a field the operation needs.
	#[error("Gateway response is missing `{field}`.")]
	MissingField {
		/// Missing field name.
		field: &'static str,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the gateway.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the gateway.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
