//! Client configuration, resolved once at start-up.
//!
//! The API base URL and the two token storage keys are mandatory. A
//! missing one is a [`ConfigError`] raised while building the config, never
//! later at request time.

use podium_store::{TokenKeys, UserKeys};

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "PODIUM_API_URL";
/// Environment variable naming the access token storage key.
pub const ENV_TOKEN_KEY: &str = "PODIUM_AUTH_TOKEN_KEY";
/// Environment variable naming the refresh token storage key.
pub const ENV_REFRESH_TOKEN_KEY: &str = "PODIUM_AUTH_REFRESH_TOKEN_KEY";
/// Optional: storage key for the operator's email.
pub const ENV_USER_EMAIL_KEY: &str = "PODIUM_USER_EMAIL_KEY";
/// Optional: storage key for the operator's role.
pub const ENV_USER_ROLE_KEY: &str = "PODIUM_USER_ROLE_KEY";

/// Fatal start-up configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// The base URL does not parse as an absolute http(s) URL.
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Everything the client needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Absolute base URL, without a trailing `/`.
    pub base_url: String,
    pub token_keys: TokenKeys,
    pub user_keys: UserKeys,
    /// Serialize concurrent refreshes so one 401 storm triggers one
    /// refresh. Off by default: every caller refreshes independently.
    pub coalesce_refresh: bool,
}

impl ClientConfig {
    /// Validates and normalizes the three mandatory settings.
    ///
    /// # Errors
    /// - [`ConfigError::Missing`] if any value is empty.
    /// - [`ConfigError::InvalidBaseUrl`] if `base_url` is not http(s).
    pub fn new(
        base_url: &str,
        access_key: &str,
        refresh_key: &str,
    ) -> Result<Self, ConfigError> {
        let base_url = non_empty(ENV_API_URL, Some(base_url.to_string()))?;
        let access_key = non_empty(ENV_TOKEN_KEY, Some(access_key.to_string()))?;
        let refresh_key = non_empty(ENV_REFRESH_TOKEN_KEY, Some(refresh_key.to_string()))?;

        Ok(Self {
            base_url: normalize_base_url(&base_url)?,
            token_keys: TokenKeys::new(access_key, refresh_key),
            user_keys: UserKeys::default(),
            coalesce_refresh: false,
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    ///
    /// This is `from_env` with the environment swapped out, so tests
    /// don't have to mutate process-global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = non_empty(ENV_API_URL, lookup(ENV_API_URL))?;
        let access_key = non_empty(ENV_TOKEN_KEY, lookup(ENV_TOKEN_KEY))?;
        let refresh_key = non_empty(ENV_REFRESH_TOKEN_KEY, lookup(ENV_REFRESH_TOKEN_KEY))?;

        let mut config = Self::new(&base_url, &access_key, &refresh_key)?;
        let defaults = UserKeys::default();
        config.user_keys = UserKeys {
            email: lookup(ENV_USER_EMAIL_KEY)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.email),
            role: lookup(ENV_USER_ROLE_KEY)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.role),
        };
        Ok(config)
    }

    /// Builder-style toggle for [`coalesce_refresh`](Self::coalesce_refresh).
    pub fn with_coalesced_refresh(mut self, enabled: bool) -> Self {
        self.coalesce_refresh = enabled;
        self
    }

    /// Builder-style override of the user metadata keys.
    pub fn with_user_keys(mut self, keys: UserKeys) -> Self {
        self.user_keys = keys;
        self
    }
}

fn non_empty(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", parsed.scheme())));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_API_URL, "https://api.paris2024.test/api/"),
            (ENV_TOKEN_KEY, "auth_token"),
            (ENV_REFRESH_TOKEN_KEY, "auth_refresh_token"),
        ]
    }

    #[test]
    fn test_from_lookup_complete_config_succeeds() {
        let config = ClientConfig::from_lookup(lookup_from(&complete())).unwrap();

        assert_eq!(config.base_url, "https://api.paris2024.test/api");
        assert_eq!(config.token_keys, TokenKeys::new("auth_token", "auth_refresh_token"));
        assert_eq!(config.user_keys, UserKeys::default());
        assert!(!config.coalesce_refresh);
    }

    #[test]
    fn test_from_lookup_each_missing_key_is_reported() {
        for missing in [ENV_API_URL, ENV_TOKEN_KEY, ENV_REFRESH_TOKEN_KEY] {
            let pairs: Vec<_> = complete().into_iter().filter(|(k, _)| *k != missing).collect();

            let result = ClientConfig::from_lookup(lookup_from(&pairs));

            assert_eq!(result, Err(ConfigError::Missing(missing)));
        }
    }

    #[test]
    fn test_from_lookup_blank_value_counts_as_missing() {
        let mut pairs = complete();
        pairs[1] = (ENV_TOKEN_KEY, "   ");

        let result = ClientConfig::from_lookup(lookup_from(&pairs));

        assert_eq!(result, Err(ConfigError::Missing(ENV_TOKEN_KEY)));
    }

    #[test]
    fn test_from_lookup_reads_optional_user_keys() {
        let mut pairs = complete();
        pairs.push((ENV_USER_EMAIL_KEY, "jo_email"));
        pairs.push((ENV_USER_ROLE_KEY, "jo_role"));

        let config = ClientConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.user_keys.email, "jo_email");
        assert_eq!(config.user_keys.role, "jo_role");
    }

    #[test]
    fn test_new_rejects_relative_and_non_http_urls() {
        assert!(matches!(
            ClientConfig::new("api/v1", "a", "r"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::new("ftp://files.example", "a", "r"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
