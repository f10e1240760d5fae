//! Outgoing header construction.
//!
//! Callers hand headers over in whatever shape is convenient
//! ([`HeaderInput`]); everything is flattened into one [`HeaderSet`] with
//! a JSON `Content-Type` default, caller overrides on top, and the bearer
//! token last.

use std::collections::{BTreeMap, HashMap};

use podium_protocol::JSON_CONTENT_TYPE;
use podium_store::TokenStore;
use podium_transport::HeaderMap;

// ---------------------------------------------------------------------------
// HeaderSet
// ---------------------------------------------------------------------------

/// A flat header map with case-insensitive keys.
///
/// Inserting `content-type` over `Content-Type` replaces the value (and
/// adopts the newer spelling) instead of producing two headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// HeaderInput
// ---------------------------------------------------------------------------

/// The shapes callers may pass extra headers in.
#[derive(Debug, Clone)]
pub enum HeaderInput {
    /// A plain key/value map.
    Map(HashMap<String, String>),
    /// Ordered pairs; later pairs win.
    Pairs(Vec<(String, String)>),
    /// A case-normalizing header collection. Repeated names are joined
    /// with `", "`; non-UTF-8 values are dropped.
    Collection(HeaderMap),
}

impl HeaderInput {
    /// Appends one header, converting to [`HeaderInput::Pairs`] if needed.
    pub fn push(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut pairs = self.into_pairs();
        pairs.push((name.into(), value.into()));
        Self::Pairs(pairs)
    }

    /// Flattens any shape into ordered pairs.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            Self::Map(map) => map.into_iter().collect(),
            Self::Pairs(pairs) => pairs,
            Self::Collection(map) => map
                .keys()
                .filter_map(|name| {
                    let values: Vec<&str> = map
                        .get_all(name)
                        .iter()
                        .filter_map(|value| match value.to_str() {
                            Ok(value) => Some(value),
                            Err(_) => {
                                tracing::warn!(header = %name, "dropping non UTF-8 header value");
                                None
                            }
                        })
                        .collect();
                    // Repeated names fold into one comma-separated value.
                    (!values.is_empty())
                        .then(|| (name.as_str().to_string(), values.join(", ")))
                })
                .collect(),
        }
    }
}

impl From<HashMap<String, String>> for HeaderInput {
    fn from(map: HashMap<String, String>) -> Self {
        Self::Map(map)
    }
}

impl From<BTreeMap<String, String>> for HeaderInput {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Pairs(map.into_iter().collect())
    }
}

impl From<Vec<(String, String)>> for HeaderInput {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Pairs(pairs)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for HeaderInput {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl From<HeaderMap> for HeaderInput {
    fn from(map: HeaderMap) -> Self {
        Self::Collection(map)
    }
}

// ---------------------------------------------------------------------------
// HeaderBuilder
// ---------------------------------------------------------------------------

/// Builds the headers of every outgoing request.
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    tokens: TokenStore,
}

impl HeaderBuilder {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }

    /// JSON content type, then `extra` on top, then the bearer token when
    /// `requires_auth` and a token is stored.
    ///
    /// A missing token is not an error: the request goes out without
    /// `Authorization` and the server's 401 drives the refresh flow.
    pub fn build_headers(&self, requires_auth: bool, extra: Option<HeaderInput>) -> HeaderSet {
        let mut headers = HeaderSet::new();
        headers.insert("Content-Type", JSON_CONTENT_TYPE);

        for (name, value) in extra.map(HeaderInput::into_pairs).unwrap_or_default() {
            headers.insert(name, value);
        }

        if requires_auth {
            let token = self.tokens.access_token();
            tracing::trace!(requires_auth, has_token = token.is_some(), "building auth headers");
            match token {
                Some(token) => headers.insert("Authorization", format!("Bearer {token}")),
                None => {
                    if cfg!(debug_assertions) {
                        tracing::warn!("auth required but no access token is stored");
                    }
                }
            }
        }

        headers
    }
}

// =========================================================================
// Tests
// =========================================================================
