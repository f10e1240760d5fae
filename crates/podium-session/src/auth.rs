//! The authentication seam the session controller drives.
//!
//! In production this is [`AuthService`]; tests plug in a scripted
//! implementation so the state machine can be exercised without HTTP.

use std::future::Future;
use std::sync::Arc;

use podium_client::{ApiError, AuthService, LoginGrant};
use podium_protocol::TokenPair;
use podium_transport::HttpTransport;

/// Login, refresh and logout, with tokens persisted by the implementor.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the controller is shared with the
/// session-expired callback and the countdown task.
pub trait Authenticator: Send + Sync + 'static {
    /// Exchanges credentials for tokens and stores them.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginGrant, ApiError>> + Send;

    /// Mints a new access token from the stored refresh token.
    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send;

    /// Forgets the stored tokens. Local only.
    fn logout(&self);
}

impl<T: HttpTransport> Authenticator for AuthService<T> {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginGrant, ApiError>> + Send {
        AuthService::login(self, email, password)
    }

    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send {
        AuthService::refresh_token(self)
    }

    fn logout(&self) {
        AuthService::logout(self);
    }
}

impl<A: Authenticator> Authenticator for Arc<A> {
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginGrant, ApiError>> + Send {
        (**self).login(email, password)
    }

    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send {
        (**self).refresh_token()
    }

    fn logout(&self) {
        (**self).logout();
    }
}
