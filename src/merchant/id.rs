//! Validated identifiers sent to the gateway.
//!
//! Merchant and terminal codes are the numeric codes the gateway issues. Invoice numbers
//! and transaction references are free-form but travel inside signed JSON and query
//! strings, so blank values and embedded whitespace or control characters are refused.

// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $accepts:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				validate($kind, &value, $accepts)?;

				Ok(Self(value))
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// Identifier kind.
		kind: &'static str,
	},
	/// The identifier contains a character its kind does not allow.
	#[error("{kind} contains a character outside its allowed set.")]
	InvalidCharacter {
		/// Identifier kind.
		kind: &'static str,
	},
}

def_id! { MerchantCode, "Numeric merchant code assigned by the gateway.", "MerchantCode", is_digit }
def_id! { TerminalCode, "Numeric terminal code assigned by the gateway.", "TerminalCode", is_digit }
def_id! { InvoiceNumber, "Merchant-side invoice number.", "InvoiceNumber", is_visible }
def_id! {
	TransactionReference,
	"Gateway transaction reference returned after payment.",
	"TransactionReference",
	is_visible
}

fn is_digit(c: char) -> bool {
	c.is_ascii_digit()
}

fn is_visible(c: char) -> bool {
	!c.is_whitespace() && !c.is_control()
}

fn validate(
	kind: &'static str,
	value: &str,
	accepts: fn(char) -> bool,
) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if !value.chars().all(accepts) {
		return Err(IdentifierError::InvalidCharacter { kind });
	}

	Ok(())
}
