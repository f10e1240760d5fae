//! Wire types for the authentication endpoints.
//!
//! Only the auth layer's shapes live here. Resource bodies (events,
//! venues, disciplines, employees, offers) are owned by the services that
//! consume the API client and never pass through this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The only role allowed to hold an authenticated session in the
/// back-office.
pub const ADMIN_ROLE: &str = "admin";

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// An access token plus the refresh token that can mint a new one.
///
/// The access token is short-lived and sent on every authenticated
/// request. The refresh token is longer-lived and only ever sent to
/// `/auth/token/refresh/`.
///
/// `Debug` is implemented by hand so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// POST /auth/login/
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /auth/login/`.
///
/// Every field is optional on purpose: a 200 without an `access` token is
/// a protocol violation the auth service reports as its own error, rather
/// than a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /auth/token/refresh/
// ---------------------------------------------------------------------------

/// Body of `POST /auth/token/refresh/`.
#[derive(Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response of `POST /auth/token/refresh/`.
///
/// The backend only rotates the access token; `refresh` is present only
/// when refresh-token rotation is enabled server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

// ---------------------------------------------------------------------------
// AuthenticatedUser
// ---------------------------------------------------------------------------

/// The signed-in back-office operator, as far as the UI is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub email: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: role.into(),
        }
    }

    /// `true` only for the exact role string `"admin"`.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl fmt::Display for AuthenticatedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.email, self.role)
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// Extracts DRF's `detail` message from a parsed error body, if any.
///
/// Django REST Framework reports most failures as `{"detail": "..."}`.
/// Field validation errors use other shapes and yield `None`.
pub fn error_detail(body: &serde_json::Value) -> Option<&str> {
    body.get("detail")
        .and_then(serde_json::Value::as_str)
        .filter(|detail| !detail.is_empty())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_login_response_full_body() {
        let body = json!({
            "access": "a.b.c",
            "refresh": "d.e.f",
            "role": "admin",
            "email": "admin@paris2024.org"
        });
        let parsed: LoginResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.access.as_deref(), Some("a.b.c"));
        assert_eq!(parsed.refresh.as_deref(), Some("d.e.f"));
        assert_eq!(parsed.role.as_deref(), Some(ADMIN_ROLE));
    }

    #[test]
    fn test_login_response_missing_access_still_parses() {
        let parsed: LoginResponse =
            serde_json::from_value(json!({ "refresh": "r" })).unwrap();
        assert!(parsed.access.is_none());
    }

    #[test]
    fn test_refresh_request_serializes_refresh_field() {
        let body = serde_json::to_value(RefreshRequest { refresh: "r" }).unwrap();
        assert_eq!(body, json!({ "refresh": "r" }));
    }

    #[test]
    fn test_is_admin_requires_exact_role() {
        assert!(AuthenticatedUser::new("a@b.fr", "admin").is_admin());
        assert!(!AuthenticatedUser::new("a@b.fr", "Admin").is_admin());
        assert!(!AuthenticatedUser::new("a@b.fr", "employe").is_admin());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let creds = Credentials::new("a@b.fr", "hunter2");
        let printed = format!("{pair:?} {creds:?}");
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("a@b.fr"));
    }

    #[test]
    fn test_error_detail_reads_drf_detail() {
        let body = json!({ "detail": "Given token not valid" });
        assert_eq!(error_detail(&body), Some("Given token not valid"));
        assert_eq!(error_detail(&json!({ "email": ["required"] })), None);
        assert_eq!(error_detail(&json!({ "detail": "" })), None);
    }
}
