//! Wire protocol for the Podium admin API.
//!
//! This crate defines the "language" the back-office client and the
//! Django REST backend speak:
//!
//! - **Types** ([`TokenPair`], [`Credentials`], [`LoginResponse`],
//!   [`AuthenticatedUser`], etc.): the bodies that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how request and response
//!   bodies are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw HTTP bytes) and the
//! API client (typed results). It doesn't know about tokens in storage or
//! session state; it only knows the shapes of the auth endpoints.
//!
//! ```text
//! Transport (bytes) → Protocol (typed bodies) → Client (fetch_api)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{Codec, JSON_CONTENT_TYPE, JsonCodec, is_json_content_type};
pub use error::ProtocolError;
pub use types::{
    ADMIN_ROLE, AuthenticatedUser, Credentials, LoginResponse,
    RefreshRequest, RefreshResponse, TokenPair, error_detail,
};
