//! The token store: sole owner of the persisted access/refresh tokens.

use std::fmt;
use std::sync::Arc;

use crate::jwt;
use crate::storage::{read_or_none, remove_or_skip, write_or_skip};
use crate::Storage;

/// The two storage keys tokens live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenKeys {
    pub access: String,
    pub refresh: String,
}

impl TokenKeys {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

/// Reads and writes the access and refresh tokens.
///
/// No other component touches the token keys. Operations never fail:
/// when the backend is missing ([`TokenStore::detached`]) or errors,
/// reads return `None` and writes do nothing.
///
/// Cloning is cheap and clones share the same backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn Storage>>,
    keys: TokenKeys,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>, keys: TokenKeys) -> Self {
        Self {
            storage: Some(storage),
            keys,
        }
    }

    /// A store with no backend at all, e.g. when running somewhere no
    /// persistent storage is available. Every read is `None`.
    pub fn detached(keys: TokenKeys) -> Self {
        Self {
            storage: None,
            keys,
        }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    fn backend(&self) -> Option<&dyn Storage> {
        self.storage.as_deref()
    }

    pub fn access_token(&self) -> Option<String> {
        let token = read_or_none(self.backend(), &self.keys.access);
        tracing::trace!(key = %self.keys.access, has_token = token.is_some(), "read access token");
        token
    }

    pub fn refresh_token(&self) -> Option<String> {
        read_or_none(self.backend(), &self.keys.refresh)
    }

    /// Writes `access` unconditionally and `refresh` only when given, so an
    /// access-only rotation keeps the existing refresh token.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        tracing::debug!(
            access_key = %self.keys.access,
            rotates_refresh = refresh.is_some(),
            "storing tokens"
        );
        write_or_skip(self.backend(), &self.keys.access, access);
        if let Some(refresh) = refresh {
            write_or_skip(self.backend(), &self.keys.refresh, refresh);
        }
    }

    /// Removes both tokens. Idempotent.
    pub fn clear_tokens(&self) {
        remove_or_skip(self.backend(), &self.keys.access);
        remove_or_skip(self.backend(), &self.keys.refresh);
    }

    /// `true` if an access token is stored and is not known to be expired.
    ///
    /// Tokens whose expiry can't be read count as valid; the server's 401
    /// has the final word.
    pub fn is_access_token_present_and_valid(&self) -> bool {
        self.is_access_token_valid_at(jwt::now_secs())
    }

    /// [`is_access_token_present_and_valid`](Self::is_access_token_present_and_valid)
    /// against an explicit clock.
    pub fn is_access_token_valid_at(&self, now: u64) -> bool {
        self.access_token()
            .is_some_and(|token| !jwt::is_expired_at(&token, now))
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("attached", &self.storage.is_some())
            .field("keys", &self.keys)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
