//! Session types: the state machine, its configuration and the values
//! the controller hands back to the UI.

use std::fmt;

use podium_protocol::AuthenticatedUser;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Routing and timing knobs for the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// The public route holding the login form. Never saved as a
    /// post-relogin redirect target.
    pub entry_route: String,

    /// Where a login lands when no route was saved.
    pub default_landing_route: String,

    /// Seconds the session-expired prompt waits before acknowledging on
    /// its own. `0` acknowledges immediately.
    pub relogin_countdown_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            entry_route: "/".to_string(),
            default_landing_route: "/dashboard".to_string(),
            relogin_countdown_secs: 10,
        }
    }
}

impl SessionConfig {
    /// `true` for any route worth returning to after a relogin.
    pub fn is_protected(&self, route: &str) -> bool {
        !route.is_empty() && route != self.entry_route
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the back-office session currently stands.
///
/// ```text
///                     login()                 ok + admin
///   Unauthenticated ──────────→ Authenticating ──────────→ Authenticated
///         ↑                          │ error / not admin        │
///         ├──────────────────────────┘                          │
///         ├─────────────────────── logout() ────────────────────┤
///         │                                                     │ force_logout()
///         │      acknowledge / countdown                        ▼
///         └──────────────────────────────────────── SessionExpiredPrompt
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
    /// The server refused to extend the session; the operator is being
    /// asked to sign in again.
    SessionExpiredPrompt,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::SessionExpiredPrompt => "session-expired",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// UI-facing results
// ---------------------------------------------------------------------------

/// What a protected page should render right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Startup restoration has not finished.
    Loading,
    /// Show the login form.
    RequireLogin,
    /// Render the page for this operator.
    Allow(AuthenticatedUser),
}

/// A successful login and where it sent the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: AuthenticatedUser,
    /// The route saved before the last forced logout, or the default
    /// landing route.
    pub redirect_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_back_office_routes() {
        let config = SessionConfig::default();
        assert_eq!(config.entry_route, "/");
        assert_eq!(config.default_landing_route, "/dashboard");
        assert_eq!(config.relogin_countdown_secs, 10);
    }

    #[test]
    fn test_is_protected_excludes_entry_route() {
        let config = SessionConfig::default();
        assert!(!config.is_protected("/"));
        assert!(!config.is_protected(""));
        assert!(config.is_protected("/dashboard"));
        assert!(config.is_protected("/management/lieux"));
    }

    #[test]
    fn test_state_defaults_to_unauthenticated() {
        assert_eq!(SessionState::default(), SessionState::Unauthenticated);
        assert_eq!(SessionState::SessionExpiredPrompt.to_string(), "session-expired");
    }
}
