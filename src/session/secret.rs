//! Bearer credential carried by a session.
//!
//! The gateway reads the credential once per attempt and only ever renders it into an
//! `Authorization` header; everything else (logs, spans, `Debug` output of a session) sees
//! `<redacted>`.

// self
use crate::_prelude::*;

/// Access token held by a [`SessionStore`](crate::session::SessionStore).
///
/// Deserializes from a bare JSON string, so refresh payloads like `{"access_token": "..."}` can
/// be read straight into it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	const REDACTED: &'static str = "<redacted>";

	/// Wraps a token issued by the login or refresh endpoint.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value; only header construction should need it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `Authorization` header value for this token.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({})", Self::REDACTED)
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(Self::REDACTED)
	}
}
