//! Unified error type for Podium.

use podium_client::{ApiError, ConfigError};
use podium_session::SessionError;

/// Top-level error wrapping every crate-specific error.
///
/// The `#[from]` conversions let `?` lift sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum PodiumError {
    /// Missing or invalid start-up configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A request failed: network, HTTP status, auth or decoding.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A session entry point failed (bad credentials, non-admin).
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl PodiumError {
    /// `true` when the operator has to sign in again.
    pub fn is_session_expired(&self) -> bool {
        match self {
            Self::Api(err) => err.is_session_expired(),
            Self::Session(SessionError::Api(err)) => err.is_session_expired(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use podium_client::{AuthError, HttpError};

    use super::*;

    #[test]
    fn test_from_config_error() {
        let err: PodiumError = ConfigError::Missing("PODIUM_API_URL").into();
        assert!(matches!(err, PodiumError::Config(_)));
        assert!(err.to_string().contains("PODIUM_API_URL"));
    }

    #[test]
    fn test_from_api_error_keeps_message() {
        let http = HttpError {
            status: 404,
            message: "(404) Not found.".into(),
            data: serde_json::json!({}),
        };
        let err: PodiumError = ApiError::from(http).into();
        assert_eq!(err.to_string(), "(404) Not found.");
        assert!(!err.is_session_expired());
    }

    #[test]
    fn test_from_session_error() {
        let err: PodiumError = SessionError::Forbidden {
            role: "editor".into(),
        }
        .into();
        assert!(matches!(err, PodiumError::Session(_)));
    }

    #[test]
    fn test_is_session_expired_sees_through_layers() {
        let expired = ApiError::SessionExpired(Box::new(AuthError::MissingRefreshToken.into()));
        let err: PodiumError = expired.into();
        assert!(err.is_session_expired());
    }
}
