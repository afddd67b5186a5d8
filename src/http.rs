//! Transport primitives for gateway requests.
//!
//! The module exposes [`HttpTransport`] alongside the request/response values that cross it so
//! downstream crates can plug in custom HTTP stacks. Every adapter must report non-success
//! responses as [`TransportError::Status`] (use [`ApiResponse::error_for_status`]); the gateway
//! classifies session expiry purely from that status field and never inspects
//! transport-specific error shapes.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	header::{ACCEPT, HeaderMap},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing gateway requests.
///
/// The trait is the gateway's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so a single transport can be shared (behind `Arc`) by every task
/// issuing requests, and the returned future must be `Send` so callers can spawn gateway calls
/// on multi-threaded executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes a single request.
	///
	/// Non-success statuses must resolve to `Err(TransportError::Status { .. })`.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods supported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Caller-facing description of a request, relative to the gateway's base URL.
///
/// Values are cheap to clone so the gateway can replay the original request verbatim after a
/// session refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the base URL (a leading `/` is accepted).
	pub endpoint: String,
	/// Query pairs appended in order.
	pub query: Vec<(String, String)>,
	/// Extra headers; names are sent as given.
	pub headers: BTreeMap<String, String>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
		Self {
			method,
			endpoint: endpoint.into(),
			query: Vec::new(),
			headers: BTreeMap::new(),
			body: None,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Get, endpoint)
	}

	/// Shorthand for a `POST` request.
	pub fn post(endpoint: impl Into<String>) -> Self {
		Self::new(Method::Post, endpoint)
	}

	/// Appends query pairs.
	pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the JSON body.
	pub fn with_json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_body<B>(self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let value = serde_json::to_value(body).map_err(Error::Encode)?;

		Ok(self.with_json(value))
	}

	/// Resolves the endpoint and query against `base` into a transport-ready request.
	pub fn resolve(&self, base: &Url) -> Result<TransportRequest, ConfigError> {
		if Url::parse(&self.endpoint).is_ok() {
			return Err(ConfigError::AbsoluteEndpoint { endpoint: self.endpoint.clone() });
		}

		for (name, value) in &self.headers {
			if !is_valid_header(name, value) {
				return Err(ConfigError::InvalidHeader { name: name.clone() });
			}
		}

		let mut url = base.join(self.endpoint.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidEndpoint { endpoint: self.endpoint.clone(), source }
		})?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		Ok(TransportRequest {
			method: self.method,
			url,
			headers: self.headers.clone(),
			body: self.body.clone(),
		})
	}
}

/// Fully resolved request handed to an [`HttpTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute URL including query.
	pub url: Url,
	/// Headers to send, including any `authorization` header attached by the gateway.
	pub headers: BTreeMap<String, String>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}

/// Response returned by an [`HttpTransport`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers with lowercase names.
	pub headers: BTreeMap<String, String>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	const MESSAGE_PREVIEW: usize = 256;

	/// Creates a response with the provided status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Creates a `200` response carrying `value` serialized as JSON.
	pub fn json_ok(value: &serde_json::Value) -> Self {
		Self::new(200, value.to_string()).with_header("content-type", "application/json")
	}

	/// Adds a header (name is lowercased).
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Returns the header value for `name`, if present.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Whether the status is in the `2xx` range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Converts non-success responses into [`TransportError::Status`].
	pub fn error_for_status(self) -> Result<Self, TransportError> {
		if self.is_success() {
			return Ok(self);
		}

		let retry_after = self.header("retry-after").and_then(parse_retry_after);
		let message = self.message_preview();

		Err(TransportError::Status { status: self.status, message, retry_after })
	}

	/// Decodes the body as JSON into `T`; an empty body decodes as JSON `null`.
	pub fn json<T>(&self, endpoint: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] =
			if self.body.iter().all(u8::is_ascii_whitespace) { b"null" } else { &self.body };
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| Error::Decode {
			endpoint: endpoint.to_owned(),
			status: self.status,
			source,
		})
	}

	fn message_preview(&self) -> String {
		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		if text.is_empty() {
			return format!("status {}", self.status);
		}

		text.chars().take(Self::MESSAGE_PREVIEW).collect()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Clients built by [`ReqwestTransport::from_config`] keep a cookie store, so session cookies
/// issued by the server (including those rotated by the refresh endpoint) are sent on every
/// request, and they do not follow redirects: a redirect to a login page must surface as a
/// status instead of being silently followed.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the gateway's timeout settings.
	pub fn from_config(config: &crate::config::GatewayConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().cookie_store(true).redirect(Policy::none());

		if let Some(timeout) = config.request_timeout {
			let timeout = std::time::Duration::try_from(timeout)
				.map_err(|_| crate::config::GatewayConfigError::NonPositiveTimeout)?;

			builder = builder.timeout(timeout);
		}

		Ok(Self(builder.build()?))
	}

	async fn execute(
		client: ReqwestClient,
		request: TransportRequest,
	) -> Result<ApiResponse, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = client.request(method, request.url).header(ACCEPT, "application/json");

		// Invalid names or values surface as builder errors from `send`.
		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		if let Some(body) = request.body.as_ref() {
			builder = builder.json(body);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let headers = from_header_map(response.headers());
		let body = response.bytes().await?.to_vec();

		ApiResponse { status, headers, body }.error_for_status()
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(Self::execute(client, request))
	}
}

#[cfg(feature = "reqwest")]
fn from_header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
	headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect()
}

fn is_valid_header(name: &str, value: &str) -> bool {
	const TOKEN_SYMBOLS: &str = "!#$%&'*+-.^_`|~";

	!name.is_empty()
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || TOKEN_SYMBOLS.contains(c))
		&& value.chars().all(|c| c == '\t' || (' '..='~').contains(&c))
}

fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
