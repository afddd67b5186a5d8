// std
use std::iter::IntoIterator;
// self
use crate::{_prelude::*, config::GatewayConfig};

/// Errors raised while constructing or validating gateway configurations.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum GatewayConfigError {
	/// Base URL cannot have paths joined onto it (e.g. `mailto:` or `data:` URLs).
	#[error("Base URL cannot be used as a base: {url}.")]
	BaseUrlCannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Base URL must use HTTPS unless insecure HTTP is explicitly allowed.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Refresh endpoint is empty or absolute.
	#[error("Refresh endpoint must be a non-empty relative path: `{endpoint}`.")]
	InvalidRefreshEndpoint {
		/// Endpoint that failed validation.
		endpoint: String,
	},
	/// At least one expiry status must be configured.
	#[error("At least one session expiry status must be configured.")]
	NoExpiryStatuses,
	/// Expiry statuses must be client or server error codes.
	#[error("Status {status} cannot signal session expiry; expected 400-599.")]
	InvalidExpiryStatus {
		/// Status that failed validation.
		status: u16,
	},
	/// Request timeout must be positive.
	#[error("The request timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Base URL every endpoint resolves against.
	pub base_url: Url,
	/// Relative refresh endpoint path.
	pub refresh_endpoint: String,
	/// Statuses that trigger a refresh.
	pub expiry_statuses: BTreeSet<u16>,
	/// Optional per-request timeout.
	pub request_timeout: Option<Duration>,
	/// Whether plain `http` base URLs are allowed.
	pub allow_insecure_http: bool,
}
impl GatewayConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_endpoint: GatewayConfig::DEFAULT_REFRESH_ENDPOINT.into(),
			expiry_statuses: GatewayConfig::DEFAULT_EXPIRY_STATUSES.into_iter().collect(),
			request_timeout: None,
			allow_insecure_http: false,
		}
	}

	/// Overrides the refresh endpoint.
	pub fn refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.refresh_endpoint = endpoint.into();

		self
	}

	/// Replaces the expiry status set.
	pub fn expiry_statuses<I>(mut self, statuses: I) -> Self
	where
		I: IntoIterator<Item = u16>,
	{
		self.expiry_statuses = statuses.into_iter().collect();

		self
	}

	/// Sets the per-request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Allows plain `http` base URLs.
	pub fn allow_insecure_http(mut self) -> Self {
		self.allow_insecure_http = true;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let mut base_url = self.base_url;

		if !base_url.cannot_be_a_base() && !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let config = GatewayConfig {
			base_url,
			refresh_endpoint: self.refresh_endpoint,
			expiry_statuses: self.expiry_statuses,
			request_timeout: self.request_timeout,
			allow_insecure_http: self.allow_insecure_http,
		};

		config.validate()?;

		Ok(config)
	}
}

impl GatewayConfig {
	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), GatewayConfigError> {
		validate_base_url(&self.base_url, self.allow_insecure_http)?;
		validate_refresh_endpoint(&self.refresh_endpoint)?;

		if self.expiry_statuses.is_empty() {
			return Err(GatewayConfigError::NoExpiryStatuses);
		}
		if let Some(&status) = self.expiry_statuses.iter().find(|s| !(400..=599).contains(*s)) {
			return Err(GatewayConfigError::InvalidExpiryStatus { status });
		}
		if self.request_timeout.is_some_and(|t| !t.is_positive()) {
			return Err(GatewayConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

fn validate_base_url(url: &Url, allow_insecure_http: bool) -> Result<(), GatewayConfigError> {
	if url.cannot_be_a_base() {
		return Err(GatewayConfigError::BaseUrlCannotBeABase { url: url.to_string() });
	}

	match url.scheme() {
		"https" => Ok(()),
		"http" if allow_insecure_http => Ok(()),
		_ => Err(GatewayConfigError::InsecureBaseUrl { url: url.to_string() }),
	}
}

fn validate_refresh_endpoint(endpoint: &str) -> Result<(), GatewayConfigError> {
	if endpoint.trim_matches('/').is_empty() || Url::parse(endpoint).is_ok() {
		Err(GatewayConfigError::InvalidRefreshEndpoint { endpoint: endpoint.into() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse configuration fixture URL.")
	}

	#[test]
	fn build_normalizes_base_path() {
		let config = GatewayConfig::builder(url("https://campus.example.com/api/v2"))
			.build()
			.expect("HTTPS base URL should validate.");

		assert_eq!(config.base_url.path(), "/api/v2/");
	}

	#[test]
	fn insecure_base_requires_opt_in() {
		let err = GatewayConfig::builder(url("http://localhost:8080"))
			.build()
			.expect_err("Plain HTTP should be rejected by default.");

		assert!(matches!(err, GatewayConfigError::InsecureBaseUrl { .. }));

		GatewayConfig::builder(url("http://localhost:8080"))
			.allow_insecure_http()
			.build()
			.expect("Plain HTTP should be accepted once allowed.");
	}

	#[test]
	fn rejects_unusable_bases_and_endpoints() {
		let err = GatewayConfig::builder(url("mailto:registrar@example.com"))
			.build()
			.expect_err("Non-base URLs should be rejected.");

		assert!(matches!(err, GatewayConfigError::BaseUrlCannotBeABase { .. }));

		for endpoint in ["", "/", "https://auth.example.com/refresh"] {
			let err = GatewayConfig::builder(url("https://campus.example.com"))
				.refresh_endpoint(endpoint)
				.build()
				.expect_err("Empty or absolute refresh endpoints should be rejected.");

			assert_eq!(
				err,
				GatewayConfigError::InvalidRefreshEndpoint { endpoint: endpoint.into() }
			);
		}
	}

	#[test]
	fn validates_expiry_statuses_and_timeout() {
		let base = url("https://campus.example.com");
		let err = GatewayConfig::builder(base.clone())
			.expiry_statuses(Vec::new())
			.build()
			.expect_err("Empty status sets should be rejected.");

		assert_eq!(err, GatewayConfigError::NoExpiryStatuses);

		let err = GatewayConfig::builder(base.clone())
			.expiry_statuses([401, 302])
			.build()
			.expect_err("Redirect statuses should be rejected.");

		assert_eq!(err, GatewayConfigError::InvalidExpiryStatus { status: 302 });

		let err = GatewayConfig::builder(base.clone())
			.request_timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert_eq!(err, GatewayConfigError::NonPositiveTimeout);

		let config = GatewayConfig::builder(base)
			.expiry_statuses([401])
			.request_timeout(Duration::seconds(10))
			.build()
			.expect("Single-status configuration should validate.");

		assert!(!config.is_expiry_status(403));
	}
}
