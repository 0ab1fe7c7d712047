//! Extraction of the five RSA integers from a vendor `RSAKeyValue` XML document.

// std
use std::path::PathBuf;
// crates.io
use base64::{DecodeError, Engine, engine::general_purpose::STANDARD};
use roxmltree::{Document, Node};
use rsa::BigUint;
use zeroize::Zeroize;
// self
use crate::_prelude::*;

/// XML elements the loader requires, in the order they are read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyField {
	/// `Modulus` (n).
	Modulus,
	/// `Exponent` (e).
	Exponent,
	/// `D`, the private exponent.
	D,
	/// `P`, the first prime factor.
	P,
	/// `Q`, the second prime factor.
	Q,
}
impl KeyField {
	/// Every required field.
	pub const ALL: [KeyField; 5] =
		[KeyField::Modulus, KeyField::Exponent, KeyField::D, KeyField::P, KeyField::Q];

	/// Returns the XML element name for the field.
	pub const fn element_name(self) -> &'static str {
		match self {
			KeyField::Modulus => "Modulus",
			KeyField::Exponent => "Exponent",
			KeyField::D => "D",
			KeyField::P => "P",
			KeyField::Q => "Q",
		}
	}
}
impl Display for KeyField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.element_name())
	}
}

/// Problems with the key file itself, raised before any RSA arithmetic happens.
///
/// Messages name the offending field at most; decoded values never appear.
#[derive(Debug, ThisError)]
pub enum KeyFileError {
	/// The file could not be read.
	#[error("Key file {} could not be read.", path.display())]
	Unreadable {
		/// Path that failed to open.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The document is not well-formed XML.
	#[error("Key file is not a well-formed XML document.")]
	Malformed {
		/// Decoder or parser failure.
		#[source]
		source: Box<dyn StdError + Send + Sync>,
	},
	/// One of the required elements is absent.
	#[error("Key file is missing the `{0}` element.")]
	MissingField(KeyField),
	/// An element's text is not base64 of a big-endian integer.
	#[error("Key file element `{field}` is not valid base64.")]
	InvalidEncoding {
		/// Field whose text failed to decode.
		field: KeyField,
		/// Decoder failure; `None` when the element was empty.
		#[source]
		source: Option<DecodeError>,
	},
}
impl KeyFileError {
	/// Returns the field this error refers to, if any.
	pub fn field(&self) -> Option<KeyField> {
		match self {
			Self::MissingField(field) | Self::InvalidEncoding { field, .. } => Some(*field),
			_ => None,
		}
	}
}

/// The five integers decoded verbatim from the key file, not yet checked for consistency.
pub struct RawKeyComponents {
	/// Modulus `n`.
	pub modulus: BigUint,
	/// Public exponent `e`.
	pub public_exponent: BigUint,
	/// Private exponent `d`.
	pub private_exponent: BigUint,
	/// Prime factor `p`.
	pub prime_p: BigUint,
	/// Prime factor `q`.
	pub prime_q: BigUint,
}
impl RawKeyComponents {
	/// Parses an `RSAKeyValue` document.
	///
	/// Elements are matched by local name at any depth, so namespaced (`ds:Modulus`) and
	/// bare documents both load. Unknown elements (`DP`, `DQ`, `InverseQ`, ...) are ignored.
	pub fn from_xml(xml: &str) -> Result<Self, KeyFileError> {
		let doc = Document::parse(xml)
			.map_err(|e| KeyFileError::Malformed { source: Box::new(e) })?;
		let read = |field| decode_field(&doc, field);

		Ok(Self {
			modulus: read(KeyField::Modulus)?,
			public_exponent: read(KeyField::Exponent)?,
			private_exponent: read(KeyField::D)?,
			prime_p: read(KeyField::P)?,
			prime_q: read(KeyField::Q)?,
		})
	}

	/// Same as [`RawKeyComponents::from_xml`] for raw file bytes.
	///
	/// UTF-8 is assumed unless the bytes open with a UTF-16 byte order mark.
	pub fn from_xml_bytes(bytes: &[u8]) -> Result<Self, KeyFileError> {
		let decode_unit: fn([u8; 2]) -> u16 = match bytes {
			[0xff, 0xfe, ..] => u16::from_le_bytes,
			[0xfe, 0xff, ..] => u16::from_be_bytes,
			_ => {
				let text = std::str::from_utf8(bytes)
					.map_err(|e| KeyFileError::Malformed { source: Box::new(e) })?;

				return Self::from_xml(text);
			},
		};
		let mut text = decode_utf16(&bytes[2..], decode_unit)?;
		let parsed = Self::from_xml(&text);

		text.zeroize();

		parsed
	}
}
impl Debug for RawKeyComponents {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RawKeyComponents")
			.field("modulus_bits", &self.modulus.bits())
			.field("secrets", &"<redacted>")
			.finish()
	}
}
impl Drop for RawKeyComponents {
	fn drop(&mut self) {
		self.private_exponent.zeroize();
		self.prime_p.zeroize();
		self.prime_q.zeroize();
	}
}

fn decode_field(doc: &Document, field: KeyField) -> Result<BigUint, KeyFileError> {
	let node = doc
		.descendants()
		.find(|n| n.is_element() && n.tag_name().name() == field.element_name())
		.ok_or(KeyFileError::MissingField(field))?;
	let mut text = element_text(node);

	if text.is_empty() {
		return Err(KeyFileError::InvalidEncoding { field, source: None });
	}

	let decoded = STANDARD.decode(text.as_bytes());

	text.zeroize();

	let mut bytes =
		decoded.map_err(|source| KeyFileError::InvalidEncoding { field, source: Some(source) })?;

	if bytes.is_empty() {
		return Err(KeyFileError::InvalidEncoding { field, source: None });
	}

	let value = BigUint::from_bytes_be(&bytes);

	bytes.zeroize();

	Ok(value)
}

fn decode_utf16(bytes: &[u8], decode_unit: fn([u8; 2]) -> u16) -> Result<String, KeyFileError> {
	if bytes.len() % 2 != 0 {
		return Err(KeyFileError::Malformed {
			source: "UTF-16 key file has an odd number of bytes.".into(),
		});
	}

	let mut units =
		bytes.chunks_exact(2).map(|pair| decode_unit([pair[0], pair[1]])).collect::<Vec<_>>();
	let text = String::from_utf16(&units);

	units.zeroize();

	text.map_err(|e| KeyFileError::Malformed { source: Box::new(e) })
}

// Text children are concatenated in document order; whitespace used to wrap long values
// is dropped before decoding.
fn element_text(node: Node) -> String {
	node.children()
		.filter(Node::is_text)
		.filter_map(|child| child.text())
		.flat_map(str::chars)
		.filter(|c| !c.is_ascii_whitespace())
		.collect()
}
