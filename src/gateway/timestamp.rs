//! `YYYY/MM/DD HH:MM:SS` timestamps stamped into signed requests.

// crates.io
use time::{
	PrimitiveDateTime, UtcOffset,
	format_description::BorrowedFormatItem,
	macros::{format_description, offset},
};
// self
use crate::_prelude::*;

const FORMAT: &[BorrowedFormatItem<'_>] =
	format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

/// Wall-clock instant rendered the way the gateway expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GatewayTimestamp(PrimitiveDateTime);
impl GatewayTimestamp {
	/// Converts `instant` into local wall-clock time at `offset`.
	pub fn at(instant: OffsetDateTime, offset: UtcOffset) -> Self {
		let local = instant.to_offset(offset);

		Self(PrimitiveDateTime::new(local.date(), local.time()))
	}

	/// Parses the gateway's textual form.
	pub fn parse(value: &str) -> Result<Self, time::error::Parse> {
		PrimitiveDateTime::parse(value, FORMAT).map(Self)
	}

	/// Underlying wall-clock value.
	pub fn datetime(&self) -> PrimitiveDateTime {
		self.0
	}
}
impl Display for GatewayTimestamp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let text = self.0.format(FORMAT).map_err(|_| std::fmt::Error)?;

		f.write_str(&text)
	}
}
impl FromStr for GatewayTimestamp {
	type Err = time::error::Parse;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Serialize for GatewayTimestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_str(self)
	}
}
impl<'de> Deserialize<'de> for GatewayTimestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		Self::parse(&raw).map_err(serde::de::Error::custom)
	}
}

/// Source of request timestamps.
///
/// The gateway compares `TimeStamp` against Iran Standard Time, so the default clock
/// renders the system time at [`GatewayClock::TEHRAN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayClock {
	/// Current time rendered at a fixed UTC offset.
	System(UtcOffset),
	/// A pinned instant, for reproducible requests.
	Fixed(GatewayTimestamp),
}
impl GatewayClock {
	/// Iran Standard Time, the gateway's local time.
	pub const TEHRAN: UtcOffset = offset!(+3:30);

	/// System clock rendered in Tehran time.
	pub fn tehran() -> Self {
		Self::System(Self::TEHRAN)
	}

	/// Returns the timestamp to stamp into the next request.
	pub fn now(&self) -> GatewayTimestamp {
		match self {
			Self::System(offset) => GatewayTimestamp::at(OffsetDateTime::now_utc(), *offset),
			Self::Fixed(timestamp) => *timestamp,
		}
	}
}
impl Default for GatewayClock {
	fn default() -> Self {
		Self::tehran()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn renders_zero_padded_local_time() {
		let stamp = GatewayTimestamp::at(datetime!(2024-03-05 20:45:09 UTC), GatewayClock::TEHRAN);

		assert_eq!(stamp.to_string(), "2024/03/06 00:15:09");
		assert_eq!(
			GatewayTimestamp::parse("2024/03/06 00:15:09").expect("Rendered form should parse."),
			stamp
		);
	}

	#[test]
	fn default_clock_renders_tehran_time() {
		assert_eq!(GatewayClock::default(), GatewayClock::System(offset!(+3:30)));

		let GatewayClock::System(offset) = GatewayClock::default() else {
			panic!("Default clock should follow the system time.");
		};
		let stamp = GatewayTimestamp::at(datetime!(2024-06-30 22:00:00 UTC), offset);

		assert_eq!(stamp.to_string(), "2024/07/01 01:30:00");
	}

	#[test]
	fn fixed_clock_is_stable() {
		let stamp =
			GatewayTimestamp::parse("2023/12/31 23:59:59").expect("Fixture timestamp should parse.");
		let clock = GatewayClock::Fixed(stamp);

		assert_eq!(clock.now(), clock.now());
		assert_eq!(
			serde_json::to_string(&clock.now()).expect("Timestamp should serialize."),
			"\"2023/12/31 23:59:59\""
		);
	}
}
