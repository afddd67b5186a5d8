//! Authenticated HTTP gateway that hides session expiry from callers: concurrent requests that
//! hit an expired session collapse onto a single refresh call and are replayed (or failed
//! together) once it settles.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod session;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use config::{GatewayConfig, GatewayConfigBuilder, GatewayConfigError};
pub use error::{Error, Result};
#[cfg(feature = "reqwest")] pub use gateway::ReqwestGateway;
pub use gateway::{Gateway, RefreshMetrics};
#[cfg(feature = "reqwest")] pub use http::ReqwestTransport;
pub use http::{ApiRequest, ApiResponse, HttpTransport, Method, TransportFuture, TransportRequest};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use session::{MemorySession, SessionStore, TokenSecret};
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
