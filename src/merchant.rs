//! Merchant profile: gateway identifiers, endpoints, and key file location.
//!
//! A [`MerchantProfile`] is plain data (serde-friendly, so it can live in whatever
//! configuration format the host application uses) validated through
//! [`MerchantProfileBuilder::build`] or [`MerchantProfile::validate`]. The gateway client
//! refuses to start with a profile that fails validation.

/// Builder API for assembling merchant profiles.
pub mod builder;
/// Validated identifiers.
pub mod id;

pub use builder::*;
pub use id::*;

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, error::ConfigError, key::KeyPolicy};

/// Gateway endpoint layout, resolved against a single base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEndpoints {
	/// Base URL every endpoint path is joined to.
	pub base: Url,
}
impl GatewayEndpoints {
	/// Production gateway host.
	pub const PRODUCTION_BASE: &'static str = "https://pep.shaparak.ir/";
	/// Payment token endpoint.
	pub const GET_TOKEN: &'static str = "Api/v1/Payment/GetToken";
	/// Transaction result endpoint.
	pub const CHECK_TRANSACTION: &'static str = "Api/v1/Payment/CheckTransactionResult";
	/// Payment verification endpoint.
	pub const VERIFY_PAYMENT: &'static str = "Api/v1/Payment/VerifyPayment";
	/// Refund endpoint.
	pub const REFUND: &'static str = "Api/v1/Payment/RefundPayment";
	/// Customer-facing payment page.
	pub const PAYMENT_PAGE: &'static str = "payment.aspx";

	/// Uses `base` as the gateway root.
	pub fn new(base: Url) -> Self {
		Self { base }
	}

	/// Endpoints of the production gateway.
	pub fn production() -> Result<Self, url::ParseError> {
		Url::parse(Self::PRODUCTION_BASE).map(Self::new)
	}

	/// Joins `path` to the base URL, treating the base as a directory.
	pub fn resolve(&self, path: &'static str) -> Result<Url, ConfigError> {
		let mut base = self.base.clone();

		if !base.path().ends_with('/') {
			let dir = format!("{}/", base.path());

			base.set_path(&dir);
		}

		base.join(path).map_err(|source| ConfigError::InvalidEndpoint { path, source })
	}

	/// Payment page URL the customer is redirected to for `token`.
	pub fn payment_page(&self, token: &str) -> Result<Url, ConfigError> {
		let mut url = self.resolve(Self::PAYMENT_PAGE)?;

		url.query_pairs_mut().append_pair("n", token);

		Ok(url)
	}
}

/// Immutable merchant configuration consumed by the gateway client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
	/// Merchant code issued by the gateway.
	pub merchant_code: MerchantCode,
	/// Terminal code issued by the gateway.
	pub terminal_code: TerminalCode,
	/// Address the gateway sends the customer back to after payment.
	pub redirect_address: Url,
	/// Location of the `RSAKeyValue` XML key file.
	pub key_file: PathBuf,
	/// Gateway endpoints.
	pub endpoints: GatewayEndpoints,
	/// Key acceptance rules.
	#[serde(default)]
	pub key_policy: KeyPolicy,
}
impl MerchantProfile {
	/// Creates a new builder.
	pub fn builder() -> MerchantProfileBuilder {
		MerchantProfileBuilder::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoints(base: &str) -> GatewayEndpoints {
		GatewayEndpoints::new(Url::parse(base).expect("Base URL fixture should parse."))
	}

	#[test]
	fn endpoints_resolve_under_base_path() {
		let root = endpoints("https://pep.shaparak.ir");
		let nested = endpoints("https://sandbox.example.com/pep");

		assert_eq!(
			root.resolve(GatewayEndpoints::GET_TOKEN)
				.expect("Token endpoint should resolve.")
				.as_str(),
			"https://pep.shaparak.ir/Api/v1/Payment/GetToken"
		);
		assert_eq!(
			nested
				.resolve(GatewayEndpoints::REFUND)
				.expect("Refund endpoint should resolve.")
				.as_str(),
			"https://sandbox.example.com/pep/Api/v1/Payment/RefundPayment"
		);
	}

	#[test]
	fn payment_page_encodes_token() {
		let production = GatewayEndpoints::production().expect("Production base should parse.");
		let url = production.payment_page("abc+/=").expect("Payment page should resolve.");

		assert_eq!(url.as_str(), "https://pep.shaparak.ir/payment.aspx?n=abc%2B%2F%3D");
	}
}
