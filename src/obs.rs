//! Optional observability helpers for gateway calls and key loading.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `pep_gateway.call` with the `operation`
//!   and `stage` fields, plus a `debug` event whenever a key file is loaded (path, outcome,
//!   and modulus size only).
//! - Enable `metrics` to increment the `pep_gateway_call_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`, and the
//!   `pep_gateway_key_load_total` counter labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::path::Path;
// self
use crate::_prelude::*;

/// Gateway operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Payment token request that precedes the redirect.
	Purchase,
	/// Transaction result lookup.
	CheckTransaction,
	/// Payment verification (settlement confirmation).
	VerifyPayment,
	/// Payment refund.
	Refund,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Purchase => "purchase",
			OperationKind::CheckTransaction => "check_transaction",
			OperationKind::VerifyPayment => "verify_payment",
			OperationKind::Refund => "refund",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for key loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyLoadOutcome {
	/// A validated key was produced.
	Loaded,
	/// The key file was unreadable, malformed, or incomplete.
	FileError,
	/// The decoded components were inconsistent.
	ValidationError,
}
impl KeyLoadOutcome {
	/// Returns a stable label suitable for event or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			KeyLoadOutcome::Loaded => "loaded",
			KeyLoadOutcome::FileError => "file_error",
			KeyLoadOutcome::ValidationError => "validation_error",
		}
	}
}

/// Records a key load through every enabled backend.
///
/// Only the path, the outcome, and the modulus size are reported.
pub fn record_key_load(path: &Path, outcome: KeyLoadOutcome, modulus_bits: Option<usize>) {
	trace_key_load(path, outcome, modulus_bits);
	count_key_load(outcome);
}
