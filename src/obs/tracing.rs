// self
use crate::{
	_prelude::*,
	obs::{CallKind, RefreshEvent},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used around every transport call.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the call kind and endpoint.
	pub fn new(kind: CallKind, endpoint: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("session_gateway.call", kind = kind.as_str(), endpoint);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, endpoint);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a refresh lifecycle event; failures log at `warn`, the rest at `debug`.
pub fn log_refresh_event(event: RefreshEvent, endpoint: &str, waiters: usize) {
	#[cfg(feature = "tracing")]
	{
		if event.is_failure() {
			tracing::warn!(event = event.as_str(), endpoint, waiters, "session refresh ended");
		} else {
			tracing::debug!(event = event.as_str(), endpoint, waiters, "session refresh");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, endpoint, waiters);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refresh_events_log_without_a_subscriber() {
		log_refresh_event(RefreshEvent::Claimed, "/courses", 0);
		log_refresh_event(RefreshEvent::Failed, "/courses", 3);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(CallKind::Replay, "/grades");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
