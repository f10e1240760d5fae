//! Remembered operator identity, used only to repopulate the UI on restart.

use std::sync::Arc;

use podium_protocol::AuthenticatedUser;

use crate::storage::{read_or_none, remove_or_skip, write_or_skip};
use crate::Storage;

/// Storage keys for the operator's email and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKeys {
    pub email: String,
    pub role: String,
}

impl Default for UserKeys {
    fn default() -> Self {
        Self {
            email: "user_email".to_string(),
            role: "user_role".to_string(),
        }
    }
}

/// Email and role persisted next to the tokens.
///
/// Same degrading contract as [`TokenStore`](crate::TokenStore).
#[derive(Clone)]
pub struct UserMetadataStore {
    storage: Option<Arc<dyn Storage>>,
    keys: UserKeys,
}

impl UserMetadataStore {
    pub fn new(storage: Arc<dyn Storage>, keys: UserKeys) -> Self {
        Self {
            storage: Some(storage),
            keys,
        }
    }

    pub fn detached(keys: UserKeys) -> Self {
        Self {
            storage: None,
            keys,
        }
    }

    /// The stored user, only if BOTH email and role are present.
    pub fn load(&self) -> Option<AuthenticatedUser> {
        let backend = self.storage.as_deref();
        let email = read_or_none(backend, &self.keys.email)?;
        let role = read_or_none(backend, &self.keys.role)?;
        Some(AuthenticatedUser { email, role })
    }

    pub fn save(&self, user: &AuthenticatedUser) {
        let backend = self.storage.as_deref();
        write_or_skip(backend, &self.keys.email, &user.email);
        write_or_skip(backend, &self.keys.role, &user.role);
    }

    pub fn clear(&self) {
        let backend = self.storage.as_deref();
        remove_or_skip(backend, &self.keys.email);
        remove_or_skip(backend, &self.keys.role);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[test]
    fn test_save_then_load_returns_user() {
        let store = UserMetadataStore::new(Arc::new(MemoryStorage::new()), UserKeys::default());
        let user = AuthenticatedUser::new("admin@paris2024.org", "admin");

        store.save(&user);

        assert_eq!(store.load(), Some(user));
    }

    #[test]
    fn test_load_with_email_only_is_none() {
        let storage = MemoryStorage::new();
        storage.set("user_email", "admin@paris2024.org").unwrap();
        let store = UserMetadataStore::new(Arc::new(storage), UserKeys::default());

        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let storage = MemoryStorage::new();
        let store = UserMetadataStore::new(Arc::new(storage.clone()), UserKeys::default());
        store.save(&AuthenticatedUser::new("a@b.fr", "admin"));

        store.clear();

        assert!(storage.is_empty());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_detached_store_loads_nothing() {
        let store = UserMetadataStore::detached(UserKeys::default());
        store.save(&AuthenticatedUser::new("a@b.fr", "admin"));
        assert_eq!(store.load(), None);
    }
}
