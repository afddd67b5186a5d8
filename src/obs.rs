//! Optional observability helpers for gateway calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_gateway.call` with the `kind`
//!   (request/refresh/replay) and `endpoint` fields, plus refresh lifecycle events.
//! - Enable `metrics` to increment the `session_gateway_call_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`, and the
//!   `session_gateway_refresh_event_total` counter labeled by `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Call kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// First attempt of a caller's request.
	Request,
	/// Session refresh call.
	Refresh,
	/// Replay of a request after a successful refresh.
	Replay,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Request => "request",
			CallKind::Refresh => "refresh",
			CallKind::Replay => "replay",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Call issued.
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

/// Refresh lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshEvent {
	/// A request claimed the refresh (`Idle → Refreshing`).
	Claimed,
	/// A request queued behind the in-flight refresh.
	Queued,
	/// Refresh succeeded; waiters released for replay.
	Succeeded,
	/// Refresh failed; session ended.
	Failed,
	/// Refresh owner dropped before settling.
	Abandoned,
	/// The refresh endpoint itself reported an expired session.
	LoopGuard,
}
impl RefreshEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshEvent::Claimed => "claimed",
			RefreshEvent::Queued => "queued",
			RefreshEvent::Succeeded => "succeeded",
			RefreshEvent::Failed => "failed",
			RefreshEvent::Abandoned => "abandoned",
			RefreshEvent::LoopGuard => "loop_guard",
		}
	}

	/// Whether the event ends the session or drops waiters.
	pub const fn is_failure(self) -> bool {
		matches!(self, RefreshEvent::Failed | RefreshEvent::Abandoned | RefreshEvent::LoopGuard)
	}
}
impl Display for RefreshEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a refresh lifecycle event through every enabled backend.
pub fn record_refresh_event(event: RefreshEvent, endpoint: &str, waiters: usize) {
	count_refresh_event(event);
	log_refresh_event(event, endpoint, waiters);
}
