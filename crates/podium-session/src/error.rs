//! Error types for the session layer.

use podium_client::ApiError;

/// Errors surfaced by [`SessionController`](crate::SessionController)
/// entry points.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Credentials were accepted but the account is not an administrator.
    /// Tokens from that login have already been discarded.
    #[error("access denied: role {role:?} is not allowed in the back-office")]
    Forbidden { role: String },

    /// Login or refresh failed at the API level. The message is the
    /// server's, ready for a form banner.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}
