//! Error types for the API client layer.

use podium_protocol::ProtocolError;
use podium_transport::TransportError;

/// A response arrived, but its status was not 2xx.
///
/// `message` is always `"(<status>) <detail>"`, where `detail` is the
/// server's `detail` field when it sent one and the reason phrase
/// otherwise. `data` is the parsed JSON error body, or `{}`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

/// Failures specific to the login/refresh flows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A refresh was requested but no refresh token is stored.
    #[error("missing refresh token")]
    MissingRefreshToken,

    /// The server answered 2xx without an access token.
    #[error("no access token in server response")]
    MissingAccessToken,
}

/// Everything `fetch_api` and the auth service can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response at all (connection refused, DNS, cancelled...).
    #[error(transparent)]
    Network(#[from] TransportError),

    /// A non-2xx response.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Login or refresh could not proceed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A 401 could not be recovered by refreshing. Tokens have been
    /// cleared and the session-expired signal has fired. The source is
    /// the refresh failure.
    #[error("session expired, please sign in again")]
    SessionExpired(#[source] Box<ApiError>),

    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}

impl ApiError {
    /// The HTTP status, for [`ApiError::Http`] only.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => Some(err.status),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}
