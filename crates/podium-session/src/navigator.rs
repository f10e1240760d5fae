//! The routing seam: where the operator is, and how to send them elsewhere.

use std::sync::{Arc, Mutex, PoisonError};

/// The UI's router, as seen by the session controller.
///
/// Calls are synchronous and must not call back into the controller.
pub trait Navigator: Send + Sync + 'static {
    /// The route currently displayed, e.g. `/management/lieux`.
    fn current_route(&self) -> String;

    /// Switches to `route`.
    fn navigate(&self, route: &str);
}

impl<N: Navigator + ?Sized> Navigator for Arc<N> {
    fn current_route(&self) -> String {
        (**self).current_route()
    }

    fn navigate(&self, route: &str) {
        (**self).navigate(route);
    }
}

/// An in-memory router that remembers every navigation.
///
/// Used by the CLI, which has no real pages, and by tests. Clones share
/// the same history.
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl MemoryNavigator {
    /// Starts on `route`.
    pub fn starting_at(route: impl Into<String>) -> Self {
        Self {
            history: Arc::new(Mutex::new(vec![route.into()])),
        }
    }

    /// Every route visited, oldest first, including the starting one.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::starting_at("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn navigate(&self, route: &str) {
        tracing::debug!(route, "navigating");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
