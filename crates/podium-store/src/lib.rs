//! Client-side persistent state for Podium.
//!
//! This crate owns everything that survives a restart of the back-office
//! client:
//!
//! 1. **Storage**: a tiny key-value seam ([`Storage`]) with an in-memory
//!    backend for tests and a JSON-file backend for the CLI.
//! 2. **Tokens**: the [`TokenStore`], the only component allowed to read
//!    or write the access and refresh tokens.
//! 3. **User metadata**: the [`UserMetadataStore`], which remembers the
//!    signed-in operator's email and role so the UI can repopulate itself.
//!    It is NOT a trust boundary; the access token is.
//!
//! Every public operation degrades instead of failing: a missing or
//! broken backend reads as "nothing stored" and writes become no-ops.

mod error;
pub mod jwt;
mod storage;
mod token_store;
mod user_store;

pub use error::StorageError;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use token_store::{TokenKeys, TokenStore};
pub use user_store::{UserKeys, UserMetadataStore};
