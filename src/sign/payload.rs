//! Request payloads and their canonical byte encoding.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Values that cannot be turned into a signable [`Payload`].
#[derive(Debug, ThisError)]
pub enum PayloadError {
	/// The value failed to serialize into JSON.
	#[error("Request payload could not be serialized.")]
	Serialize {
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// The value serialized to something other than a JSON object.
	#[error("Request payload must be a JSON object, found {found}.")]
	NotAnObject {
		/// JSON kind that was produced instead.
		found: &'static str,
	},
}

/// JSON object sent to the gateway and signed byte-for-byte.
///
/// The canonical encoding is fixed and does not depend on `serde_json` feature flags:
///
/// - compact RFC 8259 JSON without insignificant whitespace;
/// - object members ordered by byte-wise key comparison, at every depth;
/// - strings emitted as UTF-8, escaping only `"`, `\` and control characters (`\b`, `\f`,
///   `\n`, `\r`, `\t`, otherwise `\u00XX`);
/// - numbers in `serde_json`'s textual form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);
impl Payload {
	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Converts any serializable object into a payload.
	pub fn from_serializable<T>(value: &T) -> Result<Self, PayloadError>
	where
		T: ?Sized + Serialize,
	{
		match serde_json::to_value(value).map_err(|source| PayloadError::Serialize { source })? {
			Value::Object(map) => Ok(Self(map)),
			other => Err(PayloadError::NotAnObject { found: kind_of(&other) }),
		}
	}

	/// Adds or replaces a member.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);

		self
	}

	/// Adds or replaces a member in place.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	/// Returns a member by name.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Number of top-level members.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the payload has no members.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Canonical text of the payload.
	pub fn to_canonical_string(&self) -> String {
		let mut out = String::new();

		write_object(&mut out, &self.0);

		out
	}

	/// Canonical UTF-8 bytes of the payload; these are both signed and transmitted.
	pub fn canonical_bytes(&self) -> Vec<u8> {
		self.to_canonical_string().into_bytes()
	}
}
impl From<Map<String, Value>> for Payload {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}
impl TryFrom<Value> for Payload {
	type Error = PayloadError;

	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Object(map) => Ok(Self(map)),
			other => Err(PayloadError::NotAnObject { found: kind_of(&other) }),
		}
	}
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

fn write_value(out: &mut String, value: &Value) {
	match value {
		Value::Null => out.push_str("null"),
		Value::Bool(true) => out.push_str("true"),
		Value::Bool(false) => out.push_str("false"),
		Value::Number(number) => out.push_str(&number.to_string()),
		Value::String(text) => write_string(out, text),
		Value::Array(items) => {
			out.push('[');

			for (idx, item) in items.iter().enumerate() {
				if idx > 0 {
					out.push(',');
				}

				write_value(out, item);
			}

			out.push(']');
		},
		Value::Object(map) => write_object(out, map),
	}
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
	let mut members = map.iter().collect::<Vec<_>>();

	members.sort_unstable_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
	out.push('{');

	for (idx, (key, value)) in members.into_iter().enumerate() {
		if idx > 0 {
			out.push(',');
		}

		write_string(out, key);
		out.push(':');
		write_value(out, value);
	}

	out.push('}');
}

fn write_string(out: &mut String, text: &str) {
	const HEX: &[u8; 16] = b"0123456789abcdef";

	out.push('"');

	for c in text.chars() {
		match c {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\u{08}' => out.push_str("\\b"),
			'\u{0c}' => out.push_str("\\f"),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			c if (c as u32) < 0x20 => {
				let code = c as usize;

				out.push_str("\\u00");
				out.push(HEX[code >> 4] as char);
				out.push(HEX[code & 0xf] as char);
			},
			c => out.push(c),
		}
	}

	out.push('"');
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn canonical_form_sorts_keys_and_drops_whitespace() {
		let payload = Payload::try_from(json!({
			"b": 1,
			"a": { "z": [true, null, 2.5], "y": "x" },
			"InvoiceNumber": "A1"
		}))
		.expect("Object literal should become a payload.");

		assert_eq!(
			payload.to_canonical_string(),
			"{\"InvoiceNumber\":\"A1\",\"a\":{\"y\":\"x\",\"z\":[true,null,2.5]},\"b\":1}"
		);
	}

	#[test]
	fn canonical_form_matches_serde_json_compact_output() {
		let payload = Payload::new()
			.with("Amount", "1000")
			.with("Email", "buyer@example.com")
			.with("Note", "quote \" backslash \\ tab \t bell \u{07} persian سلام")
			.with("Count", 3);
		let expected = serde_json::to_string(&json!({
			"Amount": "1000",
			"Count": 3,
			"Email": "buyer@example.com",
			"Note": "quote \" backslash \\ tab \t bell \u{07} persian سلام"
		}))
		.expect("Reference encoding should succeed.");

		assert_eq!(payload.to_canonical_string(), expected);
	}

	#[test]
	fn non_objects_are_rejected() {
		let err = Payload::from_serializable(&["Amount", "1000"])
			.expect_err("Arrays are not valid payloads.");

		assert!(matches!(err, PayloadError::NotAnObject { found: "an array" }));

		let mut keyed = std::collections::BTreeMap::new();

		keyed.insert((1, 2), "tuple keys");

		let err = Payload::from_serializable(&keyed)
			.expect_err("Maps with non-string keys cannot become JSON objects.");

		assert!(matches!(err, PayloadError::Serialize { .. }));
	}
}
