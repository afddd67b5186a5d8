//! Gateway-level error types shared by the transport, session, and refresh layers.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure, including non-success HTTP statuses.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The session refresh this request was waiting on failed.
	#[error("Session refresh failed: {source}")]
	RefreshFailed {
		/// Failure raised by the refresh call, shared by every waiter of the episode.
		#[source]
		source: Arc<Error>,
	},
	/// The task driving the session refresh was dropped before the refresh settled.
	#[error("Session refresh was abandoned before it settled.")]
	RefreshAbandoned,
	/// Response body did not match the requested type.
	#[error("Response from `{endpoint}` could not be decoded.")]
	Decode {
		/// Endpoint that produced the response.
		endpoint: String,
		/// HTTP status of the response.
		status: u16,
		/// Structured parsing failure, including the path to the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Encode(#[source] serde_json::Error),
}
impl Error {
	/// Returns the HTTP status attached to the failure, if one is known.
	///
	/// Refresh failures report the status of the refresh call itself.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport(e) => e.status(),
			Self::RefreshFailed { source } => source.status(),
			Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Gateway(#[from] crate::config::GatewayConfigError),
	/// Endpoint cannot be resolved against the base URL.
	#[error("Endpoint `{endpoint}` cannot be resolved against the base URL.")]
	InvalidEndpoint {
		/// Endpoint as supplied by the caller.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint is an absolute URL; only paths relative to the base URL are accepted.
	#[error("Endpoint `{endpoint}` must be relative to the base URL.")]
	AbsoluteEndpoint {
		/// Endpoint as supplied by the caller.
		endpoint: String,
	},
	/// Header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures produced uniformly by every [`HttpTransport`](crate::http::HttpTransport)
/// adapter.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Server answered with a non-success status.
	#[error("Server responded with HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Short preview of the response body, or the canonical reason phrase.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying HTTP client reported a network failure (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the server.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the HTTP status for [`TransportError::Status`] failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
