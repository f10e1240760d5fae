//! The session-expired signal: a single callback slot.
//!
//! The API client fires it; the session controller listens. Neither
//! depends on the other, they only share this object.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// One mutable slot holding at most one "session expired" callback.
///
/// Registering replaces whatever was registered before; there is no
/// listener list. Clones share the same slot.
#[derive(Clone, Default)]
pub struct SessionExpiryNotifier {
    slot: Arc<Mutex<Option<Callback>>>,
}

impl SessionExpiryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback`, replacing any previous one.
    pub fn set_session_expired_callback(&self, callback: impl Fn() + Send + Sync + 'static) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::debug!("replacing session-expired callback");
        }
        *slot = Some(Arc::new(callback));
    }

    /// Empties the slot.
    pub fn clear_callback(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_callback(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invokes the registered callback, if any.
    ///
    /// The slot lock is released before the call, so the callback may
    /// itself re-register or clear.
    pub fn notify_session_expired(&self) {
        let callback = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match callback {
            Some(callback) => {
                tracing::info!("session expired, notifying listener");
                callback();
            }
            None => tracing::debug!("session expired, no listener registered"),
        }
    }
}

impl fmt::Debug for SessionExpiryNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionExpiryNotifier")
            .field("registered", &self.has_callback())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_notify_without_callback_is_noop() {
        let notifier = SessionExpiryNotifier::new();
        notifier.notify_session_expired();
        assert!(!notifier.has_callback());
    }

    #[test]
    fn test_notify_invokes_callback_once_per_call() {
        let notifier = SessionExpiryNotifier::new();
        let (count, callback) = counter();
        notifier.set_session_expired_callback(callback);

        notifier.notify_session_expired();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_callback_replaces_previous() {
        let notifier = SessionExpiryNotifier::new();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();
        notifier.set_session_expired_callback(first_cb);
        notifier.set_session_expired_callback(second_cb);

        notifier.notify_session_expired();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_the_slot() {
        let notifier = SessionExpiryNotifier::new();
        let (count, callback) = counter();
        notifier.clone().set_session_expired_callback(callback);

        notifier.notify_session_expired();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_clear_the_slot_reentrantly() {
        let notifier = SessionExpiryNotifier::new();
        let inner = notifier.clone();
        notifier.set_session_expired_callback(move || inner.clear_callback());

        notifier.notify_session_expired();

        assert!(!notifier.has_callback());
    }
}
