//! Session refresh orchestration with singleflight claims and FIFO replay.
//!
//! When a request fails with an expiry status, [`Gateway::execute`] hands it to the refresh
//! coordinator. The first such request claims the refresh (`Idle → Refreshing`) and issues the
//! only refresh call of the episode; every request that fails while the claim is held queues a
//! oneshot waiter instead. Checking and setting the claim happen under one lock acquisition with
//! no `.await` in between, so concurrent tasks can never both own a refresh.
//!
//! Settling drains the queue atomically and returns the coordinator to idle before any waiter
//! runs:
//!
//! - success: each waiter (in enqueue order) and the owner replay their original request once; a
//!   replay failing again is returned as-is, never refreshed a second time;
//! - failure: the session is cleared and redirected to login once, then waiters receive
//!   [`Error::RefreshFailed`] sharing one error and the owner gets its original expiry error back.
//!
//! If the owner's future is dropped mid-refresh its claim is released on drop and waiters
//! observe [`Error::RefreshAbandoned`].

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	gateway::Gateway,
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs::{self, CallKind, RefreshEvent},
};

type RefreshOutcome = Result<(), Arc<Error>>;
type Waiter = oneshot::Sender<RefreshOutcome>;

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Recovers `request` from an expiry failure by joining (or starting) a refresh episode.
	pub(crate) async fn recover(&self, request: ApiRequest, original: Error) -> Result<ApiResponse> {
		match self.refresh.claim_or_wait(&request.endpoint) {
			Turn::Owner(claim) => {
				obs::record_refresh_event(RefreshEvent::Claimed, &request.endpoint, 0);

				match self.refresh_session().await {
					Ok(()) => {
						let released = claim.settle(Ok(()));

						obs::record_refresh_event(
							RefreshEvent::Succeeded,
							&request.endpoint,
							released,
						);
					},
					Err(err) => {
						// Waiters must observe the cleared session once they are rejected.
						self.end_session();

						let released = claim.settle(Err(Arc::new(err)));

						obs::record_refresh_event(RefreshEvent::Failed, &request.endpoint, released);

						return Err(original);
					},
				}
			},
			Turn::Waiter { position, outcome } => {
				self.refresh_metrics.record_coalesced();
				obs::record_refresh_event(RefreshEvent::Queued, &request.endpoint, position);

				match outcome.await {
					Ok(Ok(())) => (),
					Ok(Err(source)) => return Err(Error::RefreshFailed { source }),
					Err(_) => return Err(Error::RefreshAbandoned),
				}
			},
		}

		self.refresh_metrics.record_replay();
		self.send(CallKind::Replay, &request).await
	}

	/// Calls the refresh endpoint once, handing the response to the session on success.
	async fn refresh_session(&self) -> Result<()> {
		self.refresh_metrics.record_attempt();

		let request = ApiRequest::post(self.config.refresh_endpoint.as_str());

		match self.send(CallKind::Refresh, &request).await {
			Ok(response) => {
				self.session.on_refreshed(&response);
				self.refresh_metrics.record_success();

				Ok(())
			},
			Err(err) => {
				self.refresh_metrics.record_failure();

				Err(err)
			},
		}
	}

	pub(crate) fn end_session(&self) {
		self.session.clear();
		self.session.redirect_to_login();
	}
}

#[derive(Debug, Default)]
struct RefreshState {
	refreshing: bool,
	waiters: Vec<Waiter>,
}

/// Owner of the refresh flag and waiter queue; shared by every clone of a gateway.
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator(Mutex<RefreshState>);
impl RefreshCoordinator {
	/// Claims the refresh when idle, otherwise queues a waiter behind the current claim.
	fn claim_or_wait<'a>(&'a self, endpoint: &'a str) -> Turn<'a> {
		let mut state = self.0.lock();

		if state.refreshing {
			let (tx, rx) = oneshot::channel();

			state.waiters.push(tx);

			Turn::Waiter { position: state.waiters.len(), outcome: rx }
		} else {
			state.refreshing = true;

			Turn::Owner(RefreshClaim { coordinator: self, endpoint, settled: false })
		}
	}

	pub(crate) fn is_refreshing(&self) -> bool {
		self.0.lock().refreshing
	}

	pub(crate) fn queued(&self) -> usize {
		self.0.lock().waiters.len()
	}

	/// Returns to idle and hands back every queued waiter in enqueue order.
	fn drain(&self) -> Vec<Waiter> {
		let mut state = self.0.lock();

		state.refreshing = false;

		mem::take(&mut state.waiters)
	}
}

enum Turn<'a> {
	Owner(RefreshClaim<'a>),
	Waiter {
		/// 1-based position in the queue.
		position: usize,
		outcome: oneshot::Receiver<RefreshOutcome>,
	},
}

/// Exclusive right to run the current refresh; releases waiters on settle or drop.
struct RefreshClaim<'a> {
	coordinator: &'a RefreshCoordinator,
	endpoint: &'a str,
	settled: bool,
}
impl RefreshClaim<'_> {
	/// Broadcasts `outcome` to every waiter and returns how many were released.
	fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		let waiters = self.coordinator.drain();
		let released = waiters.len();

		for waiter in waiters {
			// Receivers dropped by cancelled callers are skipped.
			let _ = waiter.send(outcome.clone());
		}

		released
	}
}
impl Drop for RefreshClaim<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		// Dropping the senders wakes every waiter with a closed channel.
		let waiters = self.coordinator.drain();

		obs::record_refresh_event(RefreshEvent::Abandoned, self.endpoint, waiters.len());
	}
}
