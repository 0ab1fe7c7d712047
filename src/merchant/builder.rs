// std
use std::path::PathBuf;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	key::KeyPolicy,
	merchant::{GatewayEndpoints, MerchantCode, MerchantProfile, TerminalCode},
};

/// Errors raised while constructing or validating merchant profiles.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum MerchantProfileError {
	/// Merchant code is mandatory.
	#[error("Missing merchant code.")]
	MissingMerchantCode,
	/// Terminal code is mandatory.
	#[error("Missing terminal code.")]
	MissingTerminalCode,
	/// Redirect address is mandatory.
	#[error("Missing redirect address.")]
	MissingRedirectAddress,
	/// Key file location is mandatory.
	#[error("Missing key file path.")]
	MissingKeyFile,
	/// Gateway endpoints must use HTTPS (plain HTTP is accepted for loopback hosts only).
	#[error("The gateway base URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// URL that failed validation.
		url: String,
	},
	/// The built-in production base URL could not be parsed.
	#[error("Production gateway URL is invalid.")]
	InvalidProductionBase {
		/// Underlying parsing failure.
		source: url::ParseError,
	},
	/// Redirect address must be an HTTP(S) URL.
	#[error("The redirect address must be an http or https URL: {url}.")]
	InvalidRedirectAddress {
		/// URL that failed validation.
		url: String,
	},
	/// Key policy bounds are inverted.
	#[error("Key policy minimum ({min} bits) exceeds its maximum ({max} bits).")]
	InvalidKeyPolicy {
		/// Configured minimum.
		min: usize,
		/// Configured maximum.
		max: usize,
	},
}

/// Builder for [`MerchantProfile`] values.
#[derive(Debug, Default)]
pub struct MerchantProfileBuilder {
	/// Merchant code issued by the gateway.
	pub merchant_code: Option<MerchantCode>,
	/// Terminal code issued by the gateway.
	pub terminal_code: Option<TerminalCode>,
	/// Post-payment redirect address.
	pub redirect_address: Option<Url>,
	/// XML key file location.
	pub key_file: Option<PathBuf>,
	/// Gateway endpoints; production when unset.
	pub endpoints: Option<GatewayEndpoints>,
	/// Key acceptance rules.
	pub key_policy: KeyPolicy,
}
impl MerchantProfileBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the merchant code.
	pub fn merchant_code(mut self, code: MerchantCode) -> Self {
		self.merchant_code = Some(code);

		self
	}

	/// Sets the terminal code.
	pub fn terminal_code(mut self, code: TerminalCode) -> Self {
		self.terminal_code = Some(code);

		self
	}

	/// Sets the post-payment redirect address.
	pub fn redirect_address(mut self, url: Url) -> Self {
		self.redirect_address = Some(url);

		self
	}

	/// Sets the XML key file location.
	pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.key_file = Some(path.into());

		self
	}

	/// Overrides the gateway endpoints (sandbox or mock servers).
	pub fn endpoints(mut self, endpoints: GatewayEndpoints) -> Self {
		self.endpoints = Some(endpoints);

		self
	}

	/// Overrides the key acceptance rules.
	pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
		self.key_policy = policy;

		self
	}

	/// Consumes the builder and validates the resulting profile.
	pub fn build(self) -> Result<MerchantProfile, MerchantProfileError> {
		let merchant_code = self.merchant_code.ok_or(MerchantProfileError::MissingMerchantCode)?;
		let terminal_code = self.terminal_code.ok_or(MerchantProfileError::MissingTerminalCode)?;
		let redirect_address =
			self.redirect_address.ok_or(MerchantProfileError::MissingRedirectAddress)?;
		let key_file = self.key_file.ok_or(MerchantProfileError::MissingKeyFile)?;
		let endpoints = match self.endpoints {
			Some(endpoints) => endpoints,
			None => GatewayEndpoints::production()
				.map_err(|source| MerchantProfileError::InvalidProductionBase { source })?,
		};
		let profile = MerchantProfile {
			merchant_code,
			terminal_code,
			redirect_address,
			key_file,
			endpoints,
			key_policy: self.key_policy,
		};

		profile.validate()?;

		Ok(profile)
	}
}

impl MerchantProfile {
	/// Validates invariants for the profile.
	pub fn validate(&self) -> Result<(), MerchantProfileError> {
		let base = &self.endpoints.base;

		if base.scheme() != "https" && !(base.scheme() == "http" && is_loopback(base)) {
			return Err(MerchantProfileError::InsecureEndpoint {
				url: self.endpoints.base.to_string(),
			});
		}
		if !matches!(self.redirect_address.scheme(), "http" | "https") {
			return Err(MerchantProfileError::InvalidRedirectAddress {
				url: self.redirect_address.to_string(),
			});
		}
		if self.key_file.as_os_str().is_empty() {
			return Err(MerchantProfileError::MissingKeyFile);
		}

		let (min, max) =
			(self.key_policy.effective_min_modulus_bits(), self.key_policy.max_modulus_bits);

		if min > max {
			return Err(MerchantProfileError::InvalidKeyPolicy { min, max });
		}

		Ok(())
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
