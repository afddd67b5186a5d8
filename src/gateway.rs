//! Authenticated request gateway.
//!
//! [`Gateway`] issues every request on behalf of callers and hides session expiry from them
//! whenever recovery is possible: a response carrying one of the configured expiry statuses
//! triggers a single shared refresh call, after which the original request is replayed once.
//! See [`refresh`] for the coordination protocol.

pub mod refresh;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::TransportError,
	gateway::refresh::RefreshCoordinator,
	http::{ApiRequest, ApiResponse, HttpTransport, Method},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Issues authenticated requests and coordinates session refreshes.
///
/// Clones share the transport, session, metrics, and refresh state, so every clone joins the
/// same refresh episode. Construct one gateway per session and hand clones to whoever issues
/// requests.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound call.
	pub transport: Arc<T>,
	/// Session reacting to refresh outcomes.
	pub session: Arc<dyn SessionStore>,
	/// Base URL, refresh endpoint, and expiry statuses.
	pub config: GatewayConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh: Arc<RefreshCoordinator>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		session: Arc<dyn SessionStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			session,
			config,
			refresh_metrics: Default::default(),
			refresh: Default::default(),
		}
	}

	/// Sends `request` and decodes the JSON response body into `R`.
	pub async fn request<R>(&self, request: ApiRequest) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let endpoint = request.endpoint.clone();
		let response = self.execute(request).await?;

		response.json(&endpoint)
	}

	/// Sends `request` and returns the raw response.
	///
	/// Expiry statuses are recovered through a session refresh; every other failure is returned
	/// unchanged without retrying.
	pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
		let err = match self.send(CallKind::Request, &request).await {
			Ok(response) => return Ok(response),
			Err(err) => err,
		};

		if !self.is_expiry(&err) {
			return Err(err);
		}
		if self.config.is_refresh_endpoint(&request.endpoint) {
			obs::record_refresh_event(obs::RefreshEvent::LoopGuard, &request.endpoint, 0);
			self.end_session();

			return Err(err);
		}

		self.recover(request, err).await
	}

	/// `GET endpoint?query`.
	pub async fn get<R>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(ApiRequest::get(endpoint).with_query(query.iter().copied())).await
	}

	/// `POST endpoint?query` with a JSON body.
	pub async fn post<R, B>(&self, endpoint: &str, body: &B, query: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request_with_body(Method::Post, endpoint, body, query).await
	}

	/// `PUT endpoint?query` with a JSON body.
	pub async fn put<R, B>(&self, endpoint: &str, body: &B, query: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request_with_body(Method::Put, endpoint, body, query).await
	}

	/// `PATCH endpoint?query` with a JSON body.
	pub async fn patch<R, B>(
		&self,
		endpoint: &str,
		body: &B,
		query: &[(&str, &str)],
	) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.request_with_body(Method::Patch, endpoint, body, query).await
	}

	/// `DELETE endpoint`.
	pub async fn delete<R>(&self, endpoint: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(ApiRequest::new(Method::Delete, endpoint)).await
	}

	/// Whether a session refresh is currently in flight.
	pub fn is_refreshing(&self) -> bool {
		self.refresh.is_refreshing()
	}

	/// Number of requests queued behind the in-flight refresh.
	pub fn queued_requests(&self) -> usize {
		self.refresh.queued()
	}

	async fn request_with_body<R, B>(
		&self,
		method: Method,
		endpoint: &str,
		body: &B,
		query: &[(&str, &str)],
	) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		let request =
			ApiRequest::new(method, endpoint).with_body(body)?.with_query(query.iter().copied());

		self.request(request).await
	}

	/// Issues one transport call, attaching the session's bearer credential when present.
	async fn send(&self, kind: CallKind, request: &ApiRequest) -> Result<ApiResponse> {
		let mut outbound = request.resolve(&self.config.base_url)?;

		if let Some(token) = self.session.access_token()
			&& !outbound.headers.keys().any(|name| name.eq_ignore_ascii_case("authorization"))
		{
			outbound.headers.insert("authorization".into(), token.bearer());
		}

		let span = CallSpan::new(kind, &request.endpoint);

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span.instrument(self.transport.send(outbound)).await.map_err(Error::from);

		match &result {
			Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
		}

		result
	}

	fn is_expiry(&self, err: &Error) -> bool {
		matches!(
			err,
			Error::Transport(TransportError::Status { status, .. })
				if self.config.is_expiry_status(*status)
		)
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			session: self.session.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh: self.refresh.clone(),
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a reqwest client built from `config`.
	///
	/// The client keeps a cookie store so cookie-based sessions (including cookies rotated by
	/// the refresh endpoint) are sent on every call.
	pub fn new(config: GatewayConfig, session: Arc<dyn SessionStore>) -> Result<Self> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, session, transport))
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_endpoint", &self.config.refresh_endpoint)
			.field("refreshing", &self.is_refreshing())
			.finish()
	}
}
