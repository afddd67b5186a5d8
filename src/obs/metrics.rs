// self
use crate::obs::{CallKind, CallOutcome, RefreshEvent};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_gateway_call_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a refresh lifecycle event via the global metrics recorder (when enabled).
pub fn count_refresh_event(event: RefreshEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_gateway_refresh_event_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_run_without_a_global_recorder() {
		record_call_outcome(CallKind::Refresh, CallOutcome::Failure);
		count_refresh_event(RefreshEvent::LoopGuard);
	}
}
