//! Gateway configuration and its validating builder.
//!
//! A [`GatewayConfig`] pins the base URL every endpoint resolves against, the refresh endpoint,
//! and the set of statuses that mean "session expired". Configurations can be assembled with
//! [`GatewayConfig::builder`] or deserialized and checked with [`GatewayConfig::validate`].

/// Builder API for assembling gateway configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Immutable settings consumed by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Base URL endpoints are joined onto; its path always ends with `/`.
	pub base_url: Url,
	/// Relative path of the session refresh endpoint.
	#[serde(default = "GatewayConfig::default_refresh_endpoint")]
	pub refresh_endpoint: String,
	/// Statuses that trigger the refresh-and-retry protocol.
	#[serde(default = "GatewayConfig::default_expiry_statuses")]
	pub expiry_statuses: BTreeSet<u16>,
	/// Per-request timeout applied by transports that support one.
	#[serde(default)]
	pub request_timeout: Option<Duration>,
	/// Permits plain `http` base URLs (local development and tests).
	#[serde(default)]
	pub allow_insecure_http: bool,
}
impl GatewayConfig {
	/// Refresh endpoint used when none is configured.
	pub const DEFAULT_REFRESH_ENDPOINT: &'static str = "/auth/refresh";
	/// Unauthenticated and forbidden.
	pub const DEFAULT_EXPIRY_STATUSES: [u16; 2] = [401, 403];

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Whether `status` signals an expired session.
	pub fn is_expiry_status(&self, status: u16) -> bool {
		self.expiry_statuses.contains(&status)
	}

	/// Whether `endpoint` addresses the refresh endpoint, ignoring leading slashes and query.
	pub fn is_refresh_endpoint(&self, endpoint: &str) -> bool {
		normalize_endpoint(endpoint) == normalize_endpoint(&self.refresh_endpoint)
	}

	fn default_refresh_endpoint() -> String {
		Self::DEFAULT_REFRESH_ENDPOINT.into()
	}

	fn default_expiry_statuses() -> BTreeSet<u16> {
		Self::DEFAULT_EXPIRY_STATUSES.into_iter().collect()
	}
}

fn normalize_endpoint(endpoint: &str) -> &str {
	let path = endpoint.split(['?', '#']).next().unwrap_or_default();

	path.trim_start_matches('/').trim_end_matches('/')
}
