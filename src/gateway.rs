//! Gateway client: signs each operation's payload and interprets the response envelope.
//!
//! Every call follows the same path: build the operation's payload, sign its canonical
//! bytes with the merchant key, `POST` them with the `Sign` header, then read the JSON
//! envelope `{ "IsSuccess": bool, "Message": string, ... }`. The envelope is read for every
//! HTTP status because the gateway reports failures as JSON with non-2xx codes.

pub mod inquiry;
pub mod purchase;
pub mod refund;
pub mod timestamp;
pub mod verify;

pub use inquiry::*;
pub use purchase::*;
pub use refund::*;
pub use timestamp::*;
pub use verify::*;

// crates.io
use serde::{Deserializer, de::DeserializeOwned};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::{ResponseError, TransportError},
	http::{GatewayHttpClient, GatewayRequest, GatewayResponse},
	key::GatewayKey,
	merchant::MerchantProfile,
	obs::{self, CallOutcome, CallSpan, OperationKind},
	sign::Payload,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Signed client for one merchant terminal.
///
/// The gateway owns the validated key, the merchant profile, and the transport. Cloning is
/// cheap: the key and the transport are shared through [`Arc`], and signing needs no
/// locks, so one instance can serve concurrent calls.
#[derive(Clone)]
pub struct Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	profile: MerchantProfile,
	key: Arc<GatewayKey>,
	clock: GatewayClock,
}
impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a gateway from an already loaded key and a caller-provided transport.
	pub fn with_http_client(
		profile: MerchantProfile,
		key: impl Into<Arc<GatewayKey>>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		profile.validate()?;

		Ok(Self {
			http_client: http_client.into(),
			profile,
			key: key.into(),
			clock: GatewayClock::default(),
		})
	}

	/// Loads the key named by [`MerchantProfile::key_file`] and creates a gateway.
	///
	/// Key loading is the only step that touches the filesystem; any failure is returned
	/// before a transport is used.
	pub fn load(profile: MerchantProfile, http_client: impl Into<Arc<C>>) -> Result<Self> {
		profile.validate()?;

		let key = GatewayKey::load_with_policy(&profile.key_file, &profile.key_policy)?;

		Self::with_http_client(profile, key, http_client)
	}

	/// Overrides the clock that stamps `TimeStamp` fields (defaults to Tehran system time).
	pub fn with_clock(mut self, clock: GatewayClock) -> Self {
		self.clock = clock;

		self
	}

	/// Merchant profile in use.
	pub fn profile(&self) -> &MerchantProfile {
		&self.profile
	}

	/// Signing key in use.
	pub fn key(&self) -> &GatewayKey {
		&self.key
	}

	/// Clock in use.
	pub fn clock(&self) -> GatewayClock {
		self.clock
	}

	pub(crate) async fn call<T>(
		&self,
		kind: OperationKind,
		endpoint: &'static str,
		payload: Payload,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		const STAGE: &str = "gateway.call";

		let span = CallSpan::new(kind, STAGE);

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span.instrument(self.exchange(endpoint, payload)).await;

		obs::record_call_outcome(
			kind,
			if result.is_ok() { CallOutcome::Success } else { CallOutcome::Failure },
		);

		result
	}

	async fn exchange<T>(&self, endpoint: &'static str, payload: Payload) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let url = self.profile.endpoints.resolve(endpoint)?;
		let signed = self.key.sign(&payload);
		let response = self
			.http_client
			.post(GatewayRequest::new(url, signed))
			.await
			.map_err(TransportError::network)?;

		parse_envelope(response)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Loads the merchant key and creates a gateway with the default reqwest transport.
	///
	/// The transport does not follow redirects. Use [`Gateway::load`] with a
	/// [`ReqwestHttpClient::with_client`] instance to supply timeouts or proxies.
	pub fn new(profile: MerchantProfile) -> Result<Self> {
		Self::load(profile, ReqwestHttpClient::new()?)
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("profile", &self.profile)
			.field("key", &self.key)
			.field("clock", &self.clock)
			.finish()
	}
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(rename = "IsSuccess")]
	is_success: bool,
	#[serde(flatten)]
	rest: Map<String, Value>,
}

/// Interprets a raw gateway response as the envelope of a `T`.
///
/// `IsSuccess = false` becomes [`Error::Rejected`] carrying the gateway's `Message`; a
/// successful envelope is decoded into `T` with `IsSuccess` removed.
pub fn parse_envelope<T>(response: GatewayResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let GatewayResponse { status, body } = response;
	let mut deserializer = serde_json::Deserializer::from_slice(&body);
	let envelope: Envelope = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ResponseError::Parse { source, status })?;

	if !envelope.is_success {
		let message = match envelope.rest.get("Message") {
			Some(Value::String(message)) if !message.is_empty() => message.clone(),
			_ => format!("no message (HTTP {status})"),
		};

		return Err(Error::Rejected { status, message });
	}

	serde_path_to_error::deserialize(Value::Object(envelope.rest))
		.map_err(|source| ResponseError::Parse { source, status }.into())
}

/// Accepts a string or a number and keeps its text.
///
/// The gateway is inconsistent about quoting numeric fields (amounts, reference numbers).
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<Value>::deserialize(deserializer)? {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => Ok(Some(text)),
		Some(Value::Number(number)) => Ok(Some(number.to_string())),
		Some(other) => Err(serde::de::Error::custom(format!(
			"expected a string or a number, found `{other}`"
		))),
	}
}
