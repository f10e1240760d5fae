//! Best-effort, signature-less inspection of JWT expiry.
//!
//! The client cannot verify tokens (it has no key), and does not need to:
//! the server's 401 is the real authority. Reading `exp` locally only
//! saves a round trip when a token is obviously stale. Anything that does
//! not look like a JWT with a numeric `exp` is reported as uninspectable.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;

/// The only claim the client reads.
#[derive(Debug, Clone, Deserialize)]
struct ExpiryClaims {
    #[serde(default)]
    exp: Option<serde_json::Number>,
}

/// No key, no checks: the claims are only read, never trusted.
fn inspection_only() -> Validation {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Returns the `exp` claim (seconds since the Unix epoch), if readable.
///
/// A negative `exp` reads as `0`, i.e. long expired.
pub fn inspect_expiry(token: &str) -> Option<u64> {
    let data = jsonwebtoken::decode::<ExpiryClaims>(
        token,
        &DecodingKey::from_secret(&[]),
        &inspection_only(),
    )
    .ok()?;
    let exp = data.claims.exp?;

    if let Some(secs) = exp.as_u64() {
        return Some(secs);
    }
    if exp.as_i64().is_some() {
        return Some(0);
    }
    exp.as_f64().map(|secs| if secs <= 0.0 { 0 } else { secs as u64 })
}

/// `true` only when the expiry is readable and `now >= exp` (so an
/// `exp` at or below zero is always expired).
///
/// Uninspectable tokens are never reported as expired.
pub fn is_expired_at(token: &str, now: u64) -> bool {
    inspect_expiry(token).is_some_and(|exp| now >= exp)
}

/// Current wall-clock time in whole seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    /// Builds an unsigned JWT-shaped token with the given claims.
    fn token_with(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_inspect_expiry_reads_integer_exp() {
        let token = token_with(serde_json::json!({ "exp": 1752264046, "user_id": 2 }));
        assert_eq!(inspect_expiry(&token), Some(1752264046));
    }

    #[test]
    fn test_inspect_expiry_accepts_float_exp() {
        let token = token_with(serde_json::json!({ "exp": 1000.9 }));
        assert_eq!(inspect_expiry(&token), Some(1000));
    }

    #[test]
    fn test_inspect_expiry_negative_exp_reads_as_expired() {
        let token = token_with(serde_json::json!({ "exp": -5 }));
        assert_eq!(inspect_expiry(&token), Some(0));
        assert!(is_expired_at(&token, 1000));

        let token = token_with(serde_json::json!({ "exp": -0.5 }));
        assert!(is_expired_at(&token, 0));
    }

    #[test]
    fn test_inspect_expiry_ignores_audience_and_not_before() {
        let token = token_with(serde_json::json!({
            "exp": 500,
            "aud": "backoffice",
            "nbf": u32::MAX,
        }));
        assert_eq!(inspect_expiry(&token), Some(500));
    }

    #[test]
    fn test_inspect_expiry_non_numeric_exp_is_none() {
        let token = token_with(serde_json::json!({ "exp": "tomorrow" }));
        assert_eq!(inspect_expiry(&token), None);
        assert!(!is_expired_at(&token, u64::MAX));
    }

    #[test]
    fn test_inspect_expiry_opaque_token_is_none() {
        assert_eq!(inspect_expiry("opaque-api-key"), None);
        assert_eq!(inspect_expiry("a.b"), None);
        assert_eq!(inspect_expiry("a.b.c.d"), None);
        assert_eq!(inspect_expiry("a.!!!.c"), None);
    }

    #[test]
    fn test_inspect_expiry_without_exp_is_none() {
        let token = token_with(serde_json::json!({ "user_id": 2 }));
        assert_eq!(inspect_expiry(&token), None);
    }

    #[test]
    fn test_is_expired_at_boundaries() {
        let token = token_with(serde_json::json!({ "exp": 100 }));
        assert!(!is_expired_at(&token, 99));
        assert!(is_expired_at(&token, 100));
        assert!(is_expired_at(&token, 101));
    }

    #[test]
    fn test_is_expired_at_uninspectable_is_never_expired() {
        assert!(!is_expired_at("opaque", u64::MAX));
    }
}
