//! # Podium
//!
//! Authenticated API access and session lifecycle for the Olympic Games
//! back-office.
//!
//! Podium sends every request with the operator's bearer token, silently
//! refreshes an expired token once per request, and when the server will
//! not extend the session, forces a logout with a relogin prompt that
//! brings the operator back to the page they were on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use podium::prelude::*;
//!
//! # async fn run() -> Result<(), PodiumError> {
//! let app = Podium::builder()
//!     .config(ClientConfig::new("https://api.example.org", "auth_token", "auth_refresh_token")?)
//!     .storage(FileStorage::new(".podium/state.json"))
//!     .build()?;
//!
//! if app.start().await != SessionState::Authenticated {
//!     app.session().login("chef@example.org", "secret").await?;
//! }
//! let epreuves: serde_json::Value = app.api().get("/epreuves/").await?;
//! # Ok(())
//! # }
//! ```

mod app;
mod error;
mod telemetry;

pub use app::{Podium, PodiumBuilder, SharedAuth};
pub use error::PodiumError;
pub use telemetry::init_tracing;

pub use podium_client as client;
pub use podium_protocol as protocol;
pub use podium_session as session;
pub use podium_store as store;
pub use podium_transport as transport;

/// The types most applications need.
pub mod prelude {
    pub use crate::{Podium, PodiumBuilder, PodiumError, init_tracing};
    pub use podium_client::{
        ApiClient, ApiError, AuthEvent, ClientConfig, HttpError, RequestOptions,
        SessionExpiryNotifier,
    };
    pub use podium_protocol::AuthenticatedUser;
    pub use podium_session::{
        GuardDecision, LoginOutcome, MemoryNavigator, Navigator, SessionConfig, SessionController,
        SessionError, SessionState,
    };
    pub use podium_store::{FileStorage, MemoryStorage, Storage};
    pub use podium_transport::{CachePolicy, ReqwestTransport};
}
