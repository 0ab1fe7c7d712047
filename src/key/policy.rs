//! Acceptance rules applied when reconstructing a merchant key.

// self
use crate::_prelude::*;

/// Congruence that `d * e` must satisfy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExponentCheck {
	/// `d * e ≡ 1 (mod (p-1)(q-1))`.
	#[default]
	Totient,
	/// `d * e ≡ 1 (mod lcm(p-1, q-1))`, i.e. modulo `p-1` and `q-1` separately.
	///
	/// Accepts keys whose private exponent was reduced by the Carmichael function, which
	/// some key generators emit.
	Carmichael,
}

/// Policy knobs for [`GatewayKey`](crate::key::GatewayKey) construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPolicy {
	/// Smallest accepted modulus, in bits.
	pub min_modulus_bits: usize,
	/// Largest accepted modulus, in bits.
	pub max_modulus_bits: usize,
	/// Congruence enforced between the exponents.
	pub exponent_check: ExponentCheck,
}
impl KeyPolicy {
	/// Default lower bound on the modulus size.
	pub const DEFAULT_MIN_MODULUS_BITS: usize = 1024;
	/// Default upper bound on the modulus size.
	pub const DEFAULT_MAX_MODULUS_BITS: usize = 4096;
	/// Floor below which a SHA-1 PKCS#1 v1.5 block cannot be formed, whatever the policy says.
	pub const SIGNING_FLOOR_BITS: usize = 512;

	/// Overrides the accepted modulus size range.
	pub fn with_modulus_bits(mut self, min: usize, max: usize) -> Self {
		self.min_modulus_bits = min;
		self.max_modulus_bits = max;

		self
	}

	/// Lower bound actually enforced, never below [`KeyPolicy::SIGNING_FLOOR_BITS`].
	pub fn effective_min_modulus_bits(&self) -> usize {
		self.min_modulus_bits.max(Self::SIGNING_FLOOR_BITS)
	}

	/// Overrides the exponent congruence check.
	pub fn with_exponent_check(mut self, check: ExponentCheck) -> Self {
		self.exponent_check = check;

		self
	}
}
impl Default for KeyPolicy {
	fn default() -> Self {
		Self {
			min_modulus_bits: Self::DEFAULT_MIN_MODULUS_BITS,
			max_modulus_bits: Self::DEFAULT_MAX_MODULUS_BITS,
			exponent_check: ExponentCheck::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn partial_config_falls_back_to_defaults() {
		let policy: KeyPolicy = serde_json::from_str("{\"exponent_check\":\"carmichael\"}")
			.expect("Partial key policy should deserialize.");

		assert_eq!(policy.exponent_check, ExponentCheck::Carmichael);
		assert_eq!(policy.min_modulus_bits, KeyPolicy::DEFAULT_MIN_MODULUS_BITS);
		assert_eq!(policy.max_modulus_bits, KeyPolicy::DEFAULT_MAX_MODULUS_BITS);
	}

	#[test]
	fn signing_floor_overrides_lower_minimums() {
		let policy = KeyPolicy::default().with_modulus_bits(128, 2048);

		assert_eq!(policy.effective_min_modulus_bits(), KeyPolicy::SIGNING_FLOOR_BITS);
		assert_eq!(KeyPolicy::default().effective_min_modulus_bits(), 1024);
	}
}
