//! Authenticated API access for Podium.
//!
//! This crate turns "call this endpoint" into a request with the right
//! headers, and turns the answer into a typed value or a typed error:
//!
//! 1. **Headers**: JSON by default, caller overrides, bearer token
//!    ([`HeaderBuilder`])
//! 2. **Execution**: base URL + options → transport ([`RequestExecutor`])
//! 3. **Auth flows**: login, refresh, logout ([`AuthService`])
//! 4. **Orchestration**: one refresh and one retry on 401, error
//!    normalization ([`ApiClient`])
//! 5. **Expiry signal**: a single-slot callback the session layer
//!    listens on ([`SessionExpiryNotifier`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← logs in through AuthService, listens for expiry
//!     ↕
//! Client Layer (this crate)  ← headers, 401 handling, typed errors
//!     ↕
//! Transport / Store (below)  ← sends bytes, persists tokens
//! ```

#![allow(async_fn_in_trait)]

mod api;
mod auth;
mod config;
mod error;
mod executor;
mod headers;
mod notifier;

pub use api::{ApiClient, AuthEvent};
pub use auth::{AuthService, LOGIN_ENDPOINT, LoginGrant, REFRESH_ENDPOINT, TokenRefresher};
pub use config::{
    ClientConfig, ConfigError, ENV_API_URL, ENV_REFRESH_TOKEN_KEY, ENV_TOKEN_KEY,
    ENV_USER_EMAIL_KEY, ENV_USER_ROLE_KEY,
};
pub use error::{ApiError, AuthError, HttpError};
pub use executor::{RequestExecutor, RequestOptions};
pub use headers::{HeaderBuilder, HeaderInput, HeaderSet};
pub use notifier::SessionExpiryNotifier;
