//! Merchant signing key reconstructed from the gateway's `RSAKeyValue` XML export.
//!
//! The gateway hands every merchant an XML file holding the RSA integers as base64
//! big-endian values. [`GatewayKey::load`] reads that file once, decodes the five
//! components it needs (`Modulus`, `Exponent`, `D`, `P`, `Q`), checks them against
//! [`KeyPolicy`], and yields an immutable key that can be shared across tasks (it is
//! `Send + Sync` and holds no mutable state). Construction is all-or-nothing: either a
//! fully validated key comes back or a [`KeyError`] naming what went wrong. Neither the
//! key nor any error ever renders component values.

pub mod components;
pub mod policy;

pub use components::*;
pub use policy::*;

// std
use std::{fs, path::Path};
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
	BigUint, RsaPrivateKey, RsaPublicKey,
	pkcs1v15::{Signature, SigningKey, VerifyingKey},
	signature::Verifier,
	traits::PublicKeyParts,
};
use sha1::Sha1;
use zeroize::Zeroize;
// self
use crate::{
	_prelude::*,
	obs::{self, KeyLoadOutcome},
	sign::{SignatureError, SignatureToken},
};

/// Any failure raised while turning a key file into a [`GatewayKey`].
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// The file is unreadable, malformed, or lacks a usable component.
	#[error(transparent)]
	File(#[from] KeyFileError),
	/// The decoded components do not form a consistent RSA key.
	#[error(transparent)]
	Validation(#[from] KeyValidationError),
}

/// Decoded components that do not describe a usable RSA key.
#[derive(Debug, ThisError)]
pub enum KeyValidationError {
	/// A component decoded to zero.
	#[error("Key component `{0}` must be non-zero.")]
	Zero(KeyField),
	/// The modulus size falls outside the accepted range.
	#[error("Modulus is {bits} bits; accepted range is {min}..={max} bits.")]
	ModulusSize {
		/// Bit length of the supplied modulus.
		bits: usize,
		/// Smallest accepted size.
		min: usize,
		/// Largest accepted size.
		max: usize,
	},
	/// `P` and `Q` are not two distinct factors greater than one.
	#[error("Prime factors must be distinct and greater than one.")]
	InvalidPrimes,
	/// `P * Q` differs from the supplied modulus.
	#[error("Modulus does not equal the product of the prime factors.")]
	ModulusMismatch,
	/// `D` is not the inverse of `Exponent` under the configured congruence.
	#[error("Private exponent is not the inverse of the public exponent ({check:?} check).")]
	ExponentMismatch {
		/// Congruence that failed.
		check: ExponentCheck,
	},
	/// The RSA backend refused the components.
	#[error("RSA key construction failed.")]
	Rejected {
		/// Backend failure.
		#[source]
		source: rsa::Error,
	},
}

/// Validated merchant private key, ready to sign gateway requests.
#[derive(Clone)]
pub struct GatewayKey {
	signing: SigningKey<Sha1>,
	public: GatewayPublicKey,
}
impl GatewayKey {
	/// Loads and validates a key file using [`KeyPolicy::default`].
	pub fn load(path: impl AsRef<Path>) -> Result<Self, KeyError> {
		Self::load_with_policy(path, &KeyPolicy::default())
	}

	/// Loads and validates a key file under an explicit policy.
	pub fn load_with_policy(path: impl AsRef<Path>, policy: &KeyPolicy) -> Result<Self, KeyError> {
		let path = path.as_ref();
		let result = match fs::read(path) {
			Ok(mut bytes) => {
				let key = Self::from_xml_bytes(&bytes, policy);

				bytes.zeroize();

				key
			},
			Err(source) =>
				Err(KeyFileError::Unreadable { path: path.to_path_buf(), source }.into()),
		};

		match &result {
			Ok(key) => obs::record_key_load(path, KeyLoadOutcome::Loaded, Some(key.modulus_bits())),
			Err(KeyError::File(_)) => obs::record_key_load(path, KeyLoadOutcome::FileError, None),
			Err(KeyError::Validation(_)) =>
				obs::record_key_load(path, KeyLoadOutcome::ValidationError, None),
		}

		result
	}

	/// Builds a key from an in-memory XML document.
	pub fn from_xml(xml: &str, policy: &KeyPolicy) -> Result<Self, KeyError> {
		let raw = RawKeyComponents::from_xml(xml)?;

		Ok(Self::from_components(&raw, policy)?)
	}

	/// Builds a key from raw XML file bytes.
	pub fn from_xml_bytes(bytes: &[u8], policy: &KeyPolicy) -> Result<Self, KeyError> {
		let raw = RawKeyComponents::from_xml_bytes(bytes)?;

		Ok(Self::from_components(&raw, policy)?)
	}

	/// Checks decoded components against `policy` and assembles the key.
	pub fn from_components(
		raw: &RawKeyComponents,
		policy: &KeyPolicy,
	) -> Result<Self, KeyValidationError> {
		check_components(raw, policy)?;

		let private = RsaPrivateKey::from_components(
			raw.modulus.clone(),
			raw.public_exponent.clone(),
			raw.private_exponent.clone(),
			vec![raw.prime_p.clone(), raw.prime_q.clone()],
		)
		.map_err(|source| KeyValidationError::Rejected { source })?;

		private.validate().map_err(|source| KeyValidationError::Rejected { source })?;

		let public = GatewayPublicKey::new(private.to_public_key());

		Ok(Self { signing: SigningKey::new(private), public })
	}

	/// Public half of the key, for verifying produced signatures.
	pub fn public_key(&self) -> &GatewayPublicKey {
		&self.public
	}

	/// Bit length of the modulus.
	pub fn modulus_bits(&self) -> usize {
		self.public.modulus_bits()
	}

	/// Signature block length in bytes (the modulus byte length).
	pub fn size(&self) -> usize {
		self.public.size()
	}

	pub(crate) fn signing_key(&self) -> &SigningKey<Sha1> {
		&self.signing
	}
}
impl Debug for GatewayKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GatewayKey")
			.field("modulus_bits", &self.modulus_bits())
			.field("private", &"<redacted>")
			.finish()
	}
}

/// Public half of a [`GatewayKey`]: `(n, e)` plus a PKCS#1 v1.5 / SHA-1 verifier.
#[derive(Clone, Debug)]
pub struct GatewayPublicKey {
	inner: RsaPublicKey,
	verifying: VerifyingKey<Sha1>,
}
impl GatewayPublicKey {
	/// Wraps an RSA public key.
	pub fn new(inner: RsaPublicKey) -> Self {
		let verifying = VerifyingKey::new(inner.clone());

		Self { inner, verifying }
	}

	/// Builds a public key from its modulus and exponent.
	pub fn from_parts(modulus: BigUint, exponent: BigUint) -> Result<Self, KeyValidationError> {
		RsaPublicKey::new(modulus, exponent)
			.map(Self::new)
			.map_err(|source| KeyValidationError::Rejected { source })
	}

	/// Modulus `n`.
	pub fn modulus(&self) -> &BigUint {
		self.inner.n()
	}

	/// Public exponent `e`.
	pub fn exponent(&self) -> &BigUint {
		self.inner.e()
	}

	/// Bit length of the modulus.
	pub fn modulus_bits(&self) -> usize {
		self.inner.n().bits()
	}

	/// Modulus length in bytes.
	pub fn size(&self) -> usize {
		self.inner.size()
	}

	/// Verifies `token` over `body` with PKCS#1 v1.5 and SHA-1.
	pub fn verify(&self, body: &[u8], token: &SignatureToken) -> Result<(), SignatureError> {
		let bytes = STANDARD
			.decode(token.as_str())
			.map_err(|source| SignatureError::Encoding { source })?;

		if bytes.len() != self.size() {
			return Err(SignatureError::Length { expected: self.size(), found: bytes.len() });
		}

		let signature =
			Signature::try_from(bytes.as_slice()).map_err(|_| SignatureError::Mismatch)?;

		self.verifying.verify(body, &signature).map_err(|_| SignatureError::Mismatch)
	}
}

fn check_components(raw: &RawKeyComponents, policy: &KeyPolicy) -> Result<(), KeyValidationError> {
	let zero = BigUint::from(0_u32);
	let one = BigUint::from(1_u32);
	let fields = [
		(KeyField::Modulus, &raw.modulus),
		(KeyField::Exponent, &raw.public_exponent),
		(KeyField::D, &raw.private_exponent),
		(KeyField::P, &raw.prime_p),
		(KeyField::Q, &raw.prime_q),
	];

	if let Some((field, _)) = fields.iter().find(|(_, value)| **value == zero) {
		return Err(KeyValidationError::Zero(*field));
	}

	let bits = raw.modulus.bits();
	let (min, max) = (policy.effective_min_modulus_bits(), policy.max_modulus_bits);

	if bits < min || bits > max {
		return Err(KeyValidationError::ModulusSize { bits, min, max });
	}
	if raw.prime_p == one || raw.prime_q == one || raw.prime_p == raw.prime_q {
		return Err(KeyValidationError::InvalidPrimes);
	}
	if &raw.prime_p * &raw.prime_q != raw.modulus {
		return Err(KeyValidationError::ModulusMismatch);
	}

	let mut p_minus_one = &raw.prime_p - &one;
	let mut q_minus_one = &raw.prime_q - &one;
	let mut de = &raw.private_exponent * &raw.public_exponent;
	let consistent = match policy.exponent_check {
		ExponentCheck::Totient => &de % (&p_minus_one * &q_minus_one) == one,
		ExponentCheck::Carmichael => &de % &p_minus_one == one && &de % &q_minus_one == one,
	};

	de.zeroize();
	p_minus_one.zeroize();
	q_minus_one.zeroize();

	if consistent {
		Ok(())
	} else {
		Err(KeyValidationError::ExponentMismatch { check: policy.exponent_check })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fixture(name: &str) -> String {
		let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));

		fs::read_to_string(&path)
			.unwrap_or_else(|e| panic!("Failed to read key fixture {path}: {e}"))
	}

	fn components(name: &str) -> RawKeyComponents {
		RawKeyComponents::from_xml(&fixture(name)).expect("Key fixture should parse.")
	}

	#[test]
	fn valid_fixture_satisfies_rsa_invariants() {
		let raw = components("merchant_key.xml");
		let key = GatewayKey::from_components(&raw, &KeyPolicy::default())
			.expect("Valid fixture should produce a key.");
		let one = BigUint::from(1_u32);
		let totient = (&raw.prime_p - &one) * (&raw.prime_q - &one);

		assert_eq!(key.public_key().modulus(), &(&raw.prime_p * &raw.prime_q));
		assert_eq!((&raw.private_exponent * &raw.public_exponent) % totient, one);
		assert_eq!(key.modulus_bits(), 1024);
		assert_eq!(key.size(), 128);
	}

	#[test]
	fn zero_component_is_named() {
		let mut raw = components("merchant_key.xml");

		raw.public_exponent = BigUint::from(0_u32);

		let err = GatewayKey::from_components(&raw, &KeyPolicy::default())
			.expect_err("Zero exponent must be rejected.");

		assert!(matches!(err, KeyValidationError::Zero(KeyField::Exponent)));
	}

	#[test]
	fn modulus_mismatch_is_rejected() {
		let err = GatewayKey::from_xml(
			&fixture("merchant_key_wrong_modulus.xml"),
			&KeyPolicy::default(),
		)
		.expect_err("Foreign modulus must be rejected.");

		assert!(matches!(err, KeyError::Validation(KeyValidationError::ModulusMismatch)));
	}

	#[test]
	fn inconsistent_private_exponent_is_rejected() {
		let err = GatewayKey::from_xml(
			&fixture("merchant_key_wrong_exponent.xml"),
			&KeyPolicy::default().with_exponent_check(ExponentCheck::Carmichael),
		)
		.expect_err("Tampered private exponent must be rejected.");

		assert!(matches!(
			err,
			KeyError::Validation(KeyValidationError::ExponentMismatch {
				check: ExponentCheck::Carmichael
			})
		));
	}

	#[test]
	fn carmichael_keys_need_the_relaxed_check() {
		let xml = fixture("merchant_key_carmichael.xml");
		let err = GatewayKey::from_xml(&xml, &KeyPolicy::default())
			.expect_err("Totient check should reject a Carmichael-reduced exponent.");

		assert!(matches!(
			err,
			KeyError::Validation(KeyValidationError::ExponentMismatch {
				check: ExponentCheck::Totient
			})
		));

		let key = GatewayKey::from_xml(
			&xml,
			&KeyPolicy::default().with_exponent_check(ExponentCheck::Carmichael),
		)
		.expect("Carmichael check should accept the same key.");

		assert_eq!(key.modulus_bits(), 1024);
	}

	#[test]
	fn undersized_modulus_follows_policy() {
		let xml = fixture("merchant_key_512.xml");
		let err = GatewayKey::from_xml(&xml, &KeyPolicy::default())
			.expect_err("512-bit key must be rejected by default.");

		assert!(matches!(
			err,
			KeyError::Validation(KeyValidationError::ModulusSize { bits: 512, min: 1024, .. })
		));
		assert!(
			GatewayKey::from_xml(&xml, &KeyPolicy::default().with_modulus_bits(512, 4096)).is_ok()
		);
	}

	#[test]
	fn debug_output_never_renders_key_material() {
		let raw = components("merchant_key.xml");
		let key = GatewayKey::from_components(&raw, &KeyPolicy::default())
			.expect("Valid fixture should produce a key.");
		let rendered = format!("{key:?}");

		assert_eq!(rendered, "GatewayKey { modulus_bits: 1024, private: \"<redacted>\" }");
	}
}
