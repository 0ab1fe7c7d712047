//! Deterministic request signing for the gateway's `Sign` header.
//!
//! Each call serializes the payload to its canonical bytes, hashes them with SHA-1, and
//! signs the digest with RSASSA-PKCS1-v1_5 (DigestInfo-prefixed). The gateway's verifier
//! accepts nothing else, so neither the padding scheme nor the digest is configurable.
//! PKCS#1 v1.5 is deterministic: the same key and payload always give the same token.

pub mod payload;

pub use payload::*;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{
	pkcs1v15::Signature,
	signature::{DigestSigner, SignatureEncoding},
};
use sha1::{Digest, Sha1};
// self
use crate::{_prelude::*, key::GatewayKey};

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Failures raised while checking a [`SignatureToken`] against a public key.
#[derive(Debug, ThisError)]
pub enum SignatureError {
	/// The token is not valid base64.
	#[error("Signature token is not valid base64.")]
	Encoding {
		/// Decoder failure.
		#[source]
		source: base64::DecodeError,
	},
	/// The decoded block does not match the modulus length.
	#[error("Signature block is {found} bytes; expected {expected}.")]
	Length {
		/// Modulus length in bytes.
		expected: usize,
		/// Decoded block length.
		found: usize,
	},
	/// The signature does not verify for the given body.
	#[error("Signature does not match the request body.")]
	Mismatch,
}

/// Base64 text of a PKCS#1 v1.5 signature block, placed in the `Sign` request header.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureToken(String);
impl SignatureToken {
	/// Wraps base64 text received from elsewhere (no validation happens here).
	pub fn from_base64(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the base64 text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for SignatureToken {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for SignatureToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// One signed request: the canonical body, its digest, and the signature token.
///
/// Values are built per call and never reused; [`SignedRequest::body`] is the exact byte
/// sequence that must go on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
	body: Vec<u8>,
	digest: [u8; DIGEST_LEN],
	token: SignatureToken,
}
impl SignedRequest {
	/// Canonical body bytes (signed and transmitted).
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// SHA-1 digest of [`SignedRequest::body`].
	pub fn digest(&self) -> &[u8; DIGEST_LEN] {
		&self.digest
	}

	/// Signature token for the `Sign` header.
	pub fn token(&self) -> &SignatureToken {
		&self.token
	}

	/// Splits the request into its body and token.
	pub fn into_parts(self) -> (Vec<u8>, SignatureToken) {
		(self.body, self.token)
	}
}

/// Signs `payload` with `key`.
pub fn sign(key: &GatewayKey, payload: &Payload) -> SignedRequest {
	sign_bytes(key, payload.canonical_bytes())
}

/// Signs an already-canonical body.
///
/// Callers must transmit `body` unchanged; use [`sign`] unless the bytes come from
/// [`Payload::canonical_bytes`] or an equivalent encoder.
pub fn sign_bytes(key: &GatewayKey, body: Vec<u8>) -> SignedRequest {
	let hasher = Sha1::new_with_prefix(&body);
	let mut digest = [0_u8; DIGEST_LEN];

	digest.copy_from_slice(&hasher.clone().finalize());

	let signature: Signature = key.signing_key().sign_digest(hasher);
	let token = SignatureToken(STANDARD.encode(signature.to_bytes()));

	SignedRequest { body, digest, token }
}

impl GatewayKey {
	/// Signs `payload` with this key. See [`sign`].
	pub fn sign(&self, payload: &Payload) -> SignedRequest {
		sign(self, payload)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{sync::Arc, thread};
	// self
	use super::*;
	use crate::key::KeyPolicy;

	const KEY_XML: &str =
		include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/merchant_key.xml"));
	// PKCS#1 v1.5 / SHA-1 signature of `{"Amount":"1000","InvoiceNumber":"A1"}` under the
	// fixture key, produced by an independent implementation.
	const KNOWN_TOKEN: &str = "j+uakaC4Wrsv1Q+0Csm2xBURvsiz9pWMPWwj7eQ6/NcGkbwqH9Sa8Jyi4fEJQB55lSCpp3sJC3f97mteaSU3L8kWC4zmgoUGtZXZfArJfNwxb1FLSOQ/rX7DkVWIjyjE5A2DlAEWRN/ZZHBhir6jwtNDwAEFdzn6MwW+ZjawD3M=";

	fn key() -> GatewayKey {
		GatewayKey::from_xml(KEY_XML, &KeyPolicy::default()).expect("Fixture key should load.")
	}

	fn scenario_payload(amount: &str) -> Payload {
		Payload::new().with("Amount", amount).with("InvoiceNumber", "A1")
	}

	#[test]
	fn signature_matches_independent_implementation() {
		let signed = sign(&key(), &scenario_payload("1000"));

		assert_eq!(signed.body(), b"{\"Amount\":\"1000\",\"InvoiceNumber\":\"A1\"}");
		assert_eq!(
			signed.digest(),
			&[
				0x93, 0x6a, 0xd4, 0x91, 0x24, 0x63, 0xc6, 0xb7, 0xac, 0x4e, 0xa5, 0x54, 0x82,
				0xb0, 0xa7, 0x72, 0xa0, 0x38, 0x7e, 0x0d,
			]
		);
		assert_eq!(signed.token().as_str(), KNOWN_TOKEN);
	}

	#[test]
	fn signing_is_deterministic() {
		let key = key();
		let payload = scenario_payload("1000");

		assert_eq!(key.sign(&payload), key.sign(&payload));
	}

	#[test]
	fn token_length_tracks_modulus() {
		let key = key();
		let signed = key.sign(&scenario_payload("1000"));
		let block = STANDARD.decode(signed.token().as_str()).expect("Token should be base64.");

		assert_eq!(block.len(), key.size());
		assert_eq!(signed.token().as_str().len(), key.size().div_ceil(3) * 4);
	}

	#[test]
	fn tampered_amount_fails_verification() {
		let key = key();
		let original = key.sign(&scenario_payload("1000"));
		let tampered = scenario_payload("1001").canonical_bytes();

		key.public_key()
			.verify(original.body(), original.token())
			.expect("Original body should verify.");

		assert!(matches!(
			key.public_key().verify(&tampered, original.token()),
			Err(SignatureError::Mismatch)
		));
	}

	#[test]
	fn single_character_mutations_change_the_token() {
		let key = key();
		let payload = Payload::new()
			.with("Amount", "250000")
			.with("InvoiceNumber", "INV-2024-0001")
			.with("TimeStamp", "2024/01/01 10:00:00");
		let base = key.sign(&payload);
		let body = base.body().to_vec();
		let mut seen = std::collections::HashSet::new();

		seen.insert(base.token().clone());

		for idx in 0..body.len() {
			let mut mutated = body.clone();

			mutated[idx] = if mutated[idx] == b'x' { b'y' } else { b'x' };

			let signed = sign_bytes(&key, mutated);

			assert!(
				seen.insert(signed.token().clone()),
				"Mutation at byte {idx} collided with an earlier token."
			);
		}
	}

	#[test]
	fn malformed_tokens_are_reported() {
		let key = key();
		let body = scenario_payload("1000").canonical_bytes();

		assert!(matches!(
			key.public_key().verify(&body, &SignatureToken::from_base64("not base64!")),
			Err(SignatureError::Encoding { .. })
		));
		assert!(matches!(
			key.public_key().verify(&body, &SignatureToken::from_base64("AAAA")),
			Err(SignatureError::Length { expected: 128, found: 3 })
		));
	}

	#[test]
	fn shared_key_signs_in_parallel() {
		let key = Arc::new(key());
		let handles = (0..4)
			.map(|n| {
				let key = Arc::clone(&key);

				thread::spawn(move || key.sign(&scenario_payload(&format!("{}", 1000 + n))))
			})
			.collect::<Vec<_>>();

		for (n, handle) in handles.into_iter().enumerate() {
			let signed = handle.join().expect("Signing thread should not panic.");

			assert_eq!(signed, key.sign(&scenario_payload(&format!("{}", 1000 + n))));
		}
	}
}
