//! Login, token refresh and logout against the Django backend.

use std::future::Future;
use std::sync::Arc;

use podium_protocol::{Credentials, LoginResponse, RefreshRequest, RefreshResponse, TokenPair};
use podium_store::TokenStore;
use podium_transport::HttpTransport;

use crate::api::decode_response;
use crate::executor::{RequestExecutor, RequestOptions};
use crate::{ApiError, AuthError};

pub const LOGIN_ENDPOINT: &str = "/auth/login/";
pub const REFRESH_ENDPOINT: &str = "/auth/token/refresh/";

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// `refresh` is empty if the server did not send one.
    pub tokens: TokenPair,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Anything that can mint a new access token.
///
/// The API client is generic over this so its 401 handling can be tested
/// with a scripted refresher; in production it is [`AuthService`].
pub trait TokenRefresher: Send + Sync + 'static {
    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send;
}

impl<R: TokenRefresher> TokenRefresher for Arc<R> {
    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send {
        (**self).refresh_token()
    }
}

/// Performs the auth flows and persists their results in the token store.
///
/// Both network flows are unauthenticated calls and surface the same
/// typed errors `fetch_api` would; nothing is swallowed.
#[derive(Debug)]
pub struct AuthService<T: HttpTransport> {
    executor: Arc<RequestExecutor<T>>,
    tokens: TokenStore,
}

impl<T: HttpTransport> AuthService<T> {
    pub fn new(executor: Arc<RequestExecutor<T>>, tokens: TokenStore) -> Self {
        Self { executor, tokens }
    }

    /// `POST /auth/login/`, then stores both tokens.
    ///
    /// # Errors
    /// - [`ApiError::Http`] for bad credentials (the server's 401/400).
    /// - [`AuthError::MissingAccessToken`] if a 2xx carried no token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let options = RequestOptions::post().json(&Credentials::new(email, password))?;
        let response = self
            .executor
            .make_request(LOGIN_ENDPOINT, &options, false)
            .await?;
        let body: LoginResponse = decode_response(response)?;

        let access = body
            .access
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;
        self.tokens.set_tokens(&access, body.refresh.as_deref());
        tracing::info!(email, role = body.role.as_deref().unwrap_or("?"), "logged in");

        Ok(LoginGrant {
            tokens: TokenPair::new(access, body.refresh.unwrap_or_default()),
            email: body.email,
            role: body.role,
        })
    }

    /// `POST /auth/token/refresh/` with the stored refresh token, then
    /// stores the new access token.
    ///
    /// The refresh token is only rewritten if the server rotated it.
    ///
    /// # Errors
    /// - [`AuthError::MissingRefreshToken`] with no network call if none
    ///   is stored.
    /// - [`ApiError::Http`] when the server rejects the refresh token.
    pub async fn refresh_token(&self) -> Result<TokenPair, ApiError> {
        let refresh = self
            .tokens
            .refresh_token()
            .ok_or(AuthError::MissingRefreshToken)?;

        let options = RequestOptions::post().json(&RefreshRequest { refresh: &refresh })?;
        let response = self
            .executor
            .make_request(REFRESH_ENDPOINT, &options, false)
            .await?;
        let body: RefreshResponse = decode_response(response)?;

        let access = body
            .access
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;
        self.tokens.set_tokens(&access, body.refresh.as_deref());
        tracing::info!(rotated_refresh = body.refresh.is_some(), "access token refreshed");

        Ok(TokenPair::new(access, body.refresh.unwrap_or(refresh)))
    }

    /// Local-only logout: forget both tokens. No request is sent.
    pub fn logout(&self) {
        self.tokens.clear_tokens();
        tracing::info!("logged out, tokens cleared");
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }
}

impl<T: HttpTransport> TokenRefresher for AuthService<T> {
    fn refresh_token(&self) -> impl Future<Output = Result<TokenPair, ApiError>> + Send {
        AuthService::refresh_token(self)
    }
}
