//! Session lifecycle for the Podium back-office.
//!
//! This crate decides who is signed in and what the UI should show:
//!
//! 1. **Restoration**: on start-up, trust a valid stored token, else try
//!    one refresh ([`SessionController::restore`])
//! 2. **Login / logout**: admins only ([`SessionController::login`])
//! 3. **Forced logout**: reacts to the API client's session-expired
//!    signal with a prompt and a relogin countdown
//! 4. **Routing**: remembers where the operator was so a relogin brings
//!    them back ([`Navigator`])
//!
//! # How it fits in the stack
//!
//! ```text
//! UI / CLI (above)  ← guard(), login(), logout(), state
//!     ↕
//! Session Layer (this crate)  ← SessionController state machine
//!     ↕
//! Client Layer (below)  ← AuthService, SessionExpiryNotifier, AuthEvent
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod controller;
mod countdown;
mod error;
mod navigator;
mod session;

pub use auth::Authenticator;
pub use controller::SessionController;
pub use countdown::Countdown;
pub use error::SessionError;
pub use navigator::{MemoryNavigator, Navigator};
pub use session::{GuardDecision, LoginOutcome, SessionConfig, SessionState};
