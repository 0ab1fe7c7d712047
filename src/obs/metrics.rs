// self
use crate::obs::{CallOutcome, KeyLoadOutcome, OperationKind};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: OperationKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pep_gateway_call_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

pub(crate) fn count_key_load(outcome: KeyLoadOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("pep_gateway_key_load_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
