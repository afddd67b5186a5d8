//! Demonstrates several concurrent requests collapsing onto one session refresh.
//!
//! 1. Implement [`HttpTransport`] for an in-process mock server whose access token has already
//!    rotated, so every request carrying the old token is answered with `401`.
//! 2. Seed a [`MemorySession`] with the stale token and build a [`Gateway`] around both.
//! 3. Fire the requests concurrently: one of them refreshes, the others queue, and all of them
//!    are replayed with the rotated token.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use serde_json::json;
use url::Url;
// self
use session_gateway::{
	ApiResponse, Gateway, GatewayConfig, HttpTransport, MemorySession, Method, SessionStore,
	TransportFuture, TransportRequest,
};

/// Mock campus API that only accepts its current token.
struct MockCampusApi {
	current_token: Mutex<String>,
	refreshes: AtomicU64,
}
impl MockCampusApi {
	fn new(current_token: &str) -> Self {
		Self { current_token: Mutex::new(current_token.into()), refreshes: AtomicU64::new(0) }
	}
}
impl HttpTransport for MockCampusApi {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			// Latency gives concurrent callers time to pile up behind the refresh.
			tokio::time::sleep(StdDuration::from_millis(50)).await;

			let path = request.url.path().to_owned();

			if request.method == Method::Post && path.ends_with("/auth/refresh") {
				let generation = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;
				let token = format!("token-{generation}");

				*self.current_token.lock() = token.clone();

				return Ok(ApiResponse::json_ok(&json!({ "access_token": token })));
			}

			let expected = format!("Bearer {}", self.current_token.lock());

			if request.headers.get("authorization") != Some(&expected) {
				return ApiResponse::new(401, "token expired").error_for_status();
			}

			Ok(ApiResponse::json_ok(&json!({ "path": path, "ok": true })))
		})
	}
}

/// Fires `paths` concurrently through one gateway and returns every response body.
async fn fetch_all(
	gateway: &Gateway<MockCampusApi>,
	paths: &[&'static str],
) -> Result<Vec<serde_json::Value>> {
	let tasks = paths
		.iter()
		.map(|&path| {
			let gateway = gateway.clone();

			tokio::spawn(async move { gateway.get::<serde_json::Value>(path, &[]).await })
		})
		.collect::<Vec<_>>();
	let mut bodies = Vec::with_capacity(tasks.len());

	for task in tasks {
		bodies.push(task.await??);
	}

	Ok(bodies)
}

fn build_gateway() -> Result<(Gateway<MockCampusApi>, Arc<MemorySession>)> {
	let api = Arc::new(MockCampusApi::new("token-0"));
	let session = Arc::new(MemorySession::with_access_token("expired-token"));
	let store: Arc<dyn SessionStore> = session.clone();
	let config = GatewayConfig::builder(Url::parse("https://campus.example.com/api/")?).build()?;

	Ok((Gateway::with_transport(config, store, api), session))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let (gateway, _session) = build_gateway()?;

	for body in fetch_all(&gateway, &["/courses", "/grades", "/attendance", "/invitations"]).await? {
		println!("Response: {body}.");
	}

	println!(
		"Refresh calls: {}; coalesced requests: {}; replays: {}.",
		gateway.refresh_metrics.attempts(),
		gateway.refresh_metrics.coalesced(),
		gateway.refresh_metrics.replays(),
	);

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn concurrent_requests_share_one_refresh() {
		let (gateway, session) = build_gateway().expect("Demo gateway should build.");
		let bodies = fetch_all(&gateway, &["/courses", "/grades", "/attendance"])
			.await
			.expect("Every request should recover after the refresh.");

		assert_eq!(bodies.len(), 3);
		assert!(bodies.iter().all(|body| body["ok"] == json!(true)));
		assert_eq!(gateway.refresh_metrics.attempts(), 1);
		assert_eq!(gateway.refresh_metrics.replays(), 3);
		assert_eq!(session.refreshes(), 1);
		assert_eq!(session.clears(), 0);
	}
}
