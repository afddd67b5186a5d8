//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	http::ApiResponse,
	session::{SessionStore, TokenSecret},
};

/// Credential payload recognized in refresh endpoint responses.
#[derive(Deserialize)]
struct RefreshedCredentials {
	#[serde(alias = "accessToken")]
	access_token: Option<TokenSecret>,
}

#[derive(Debug, Default)]
struct SessionState {
	access_token: Option<TokenSecret>,
	clears: u64,
	redirects: u64,
	refreshes: u64,
}

/// In-process session that keeps an optional bearer token and counts lifecycle calls.
///
/// Refresh responses shaped like `{"access_token": "..."}` (or `accessToken`) rotate the stored
/// token; any other body leaves it untouched, which suits cookie-based sessions.
#[derive(Debug, Default)]
pub struct MemorySession(RwLock<SessionState>);
impl MemorySession {
	/// Creates a session seeded with a bearer token.
	pub fn with_access_token(token: impl Into<String>) -> Self {
		Self(RwLock::new(SessionState {
			access_token: Some(TokenSecret::new(token)),
			..Default::default()
		}))
	}

	/// Replaces the stored bearer token.
	pub fn set_access_token(&self, token: impl Into<String>) {
		self.0.write().access_token = Some(TokenSecret::new(token));
	}

	/// Whether the session currently holds a credential.
	pub fn is_authenticated(&self) -> bool {
		self.0.read().access_token.is_some()
	}

	/// Number of times the session was cleared.
	pub fn clears(&self) -> u64 {
		self.0.read().clears
	}

	/// Number of login redirects requested.
	pub fn redirects(&self) -> u64 {
		self.0.read().redirects
	}

	/// Number of successful refreshes observed.
	pub fn refreshes(&self) -> u64 {
		self.0.read().refreshes
	}
}
impl SessionStore for MemorySession {
	fn clear(&self) {
		let mut state = self.0.write();

		state.access_token = None;
		state.clears += 1;
	}

	fn redirect_to_login(&self) {
		self.0.write().redirects += 1;
	}

	fn access_token(&self) -> Option<TokenSecret> {
		self.0.read().access_token.clone()
	}

	fn on_refreshed(&self, response: &ApiResponse) {
		let rotated = serde_json::from_slice::<RefreshedCredentials>(&response.body)
			.ok()
			.and_then(|credentials| credentials.access_token);
		let mut state = self.0.write();

		state.refreshes += 1;

		if let Some(token) = rotated {
			state.access_token = Some(token);
		}
	}
}
