#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
use time::Duration;
// self
use session_gateway::{
	Error, GatewayConfig, MemorySession, ReqwestGateway, SessionStore, error::TransportError,
	url::Url,
};

#[derive(Debug, PartialEq, Deserialize)]
struct Profile {
	id: String,
	role: String,
}

fn build_gateway(server: &MockServer, token: &str) -> (ReqwestGateway, Arc<MemorySession>) {
	let config = GatewayConfig::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse successfully."),
	)
	.allow_insecure_http()
	.request_timeout(Duration::seconds(5))
	.build()
	.expect("Gateway configuration should build successfully.");
	let session = Arc::new(MemorySession::with_access_token(token));
	let store: Arc<dyn SessionStore> = session.clone();
	let gateway =
		ReqwestGateway::new(config, store).expect("Reqwest gateway should build successfully.");

	(gateway, session)
}

#[tokio::test]
async fn expired_bearer_is_refreshed_and_replayed() {
	let server = MockServer::start_async().await;
	let (gateway, session) = build_gateway(&server, "stale-token");
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer stale-token");
			then.status(401).body("token expired");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"fresh-token\"}");
		})
		.await;
	let replay = server
		.mock_async(|when, then| {
			when.method(GET).path("/profile").header("authorization", "Bearer fresh-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"s-17\",\"role\":\"student\"}");
		})
		.await;
	let profile: Profile =
		gateway.get("/profile", &[]).await.expect("Expired session should be recovered.");

	assert_eq!(profile, Profile { id: "s-17".into(), role: "student".into() });

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	replay.assert_calls_async(1).await;

	assert_eq!(session.refreshes(), 1);
	assert_eq!(session.clears(), 0);
}

#[tokio::test]
async fn server_errors_pass_through_with_retry_hint() {
	let server = MockServer::start_async().await;
	let (gateway, session) = build_gateway(&server, "valid-token");
	let failing = server
		.mock_async(|when, then| {
			when.method(POST).path("/invitations").json_body(json!({ "email": "a@b.edu" }));
			then.status(503).header("retry-after", "5").body("maintenance");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200);
		})
		.await;
	let err = gateway
		.post::<serde_json::Value, _>("/invitations", &json!({ "email": "a@b.edu" }), &[])
		.await
		.expect_err("Service unavailable should surface to the caller.");

	match err {
		Error::Transport(TransportError::Status { status, message, retry_after }) => {
			assert_eq!(status, 503);
			assert_eq!(message, "maintenance");
			assert_eq!(retry_after, Some(Duration::seconds(5)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	failing.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert_eq!(session.clears(), 0);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session() {
	let server = MockServer::start_async().await;
	let (gateway, session) = build_gateway(&server, "revoked-token");
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/attendance");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401).body("refresh token revoked");
		})
		.await;
	let err = gateway
		.get::<serde_json::Value>("/attendance", &[])
		.await
		.expect_err("A rejected refresh should fail the request.");

	assert_eq!(err.status(), Some(401));

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(session.clears(), 1);
	assert_eq!(session.redirects(), 1);
	assert!(!session.is_authenticated());
}

#[tokio::test]
async fn empty_delete_responses_decode_as_unit() {
	let server = MockServer::start_async().await;
	let (gateway, _session) = build_gateway(&server, "valid-token");
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/enrollments/9");
			then.status(204);
		})
		.await;

	gateway.delete::<()>("/enrollments/9").await.expect("204 responses should decode as unit.");

	delete.assert_calls_async(1).await;
}
