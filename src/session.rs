//! Session contracts consumed by the gateway and the bundled in-memory implementation.

pub mod memory;
pub mod secret;

pub use memory::MemorySession;
pub use secret::TokenSecret;

// self
use crate::http::ApiResponse;

/// Externally owned credential/identity state the gateway reacts to.
///
/// The gateway assumes the session already holds valid credentials before the first request.
/// It only ever calls [`clear`](SessionStore::clear) and
/// [`redirect_to_login`](SessionStore::redirect_to_login) when a session cannot be recovered,
/// and does so at most once per refresh episode. Both calls happen synchronously on the task
/// that observed the failure, so implementations must not block.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Drops every credential and identity the session holds.
	fn clear(&self);

	/// Sends the user back to the login entry point.
	fn redirect_to_login(&self);

	/// Credential attached as `Authorization: Bearer` on every attempt, if the session uses
	/// bearer tokens rather than cookies.
	///
	/// The gateway reads this per attempt, so replays after a refresh carry the rotated value.
	fn access_token(&self) -> Option<TokenSecret> {
		None
	}

	/// Receives the successful refresh endpoint response before queued requests are replayed.
	fn on_refreshed(&self, response: &ApiResponse) {
		let _ = response;
	}
}
