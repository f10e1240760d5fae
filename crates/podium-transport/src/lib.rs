//! Transport abstraction layer for Podium.
//!
//! Provides the [`HttpTransport`] trait ("send this request, give me the
//! raw response") plus the plain request/response values that cross it.
//! Everything above this crate (header building, 401 handling, JSON
//! decoding) is written against the trait, so tests can swap in a
//! scripted transport and production uses [`ReqwestTransport`].
//!
//! The transport never interprets status codes and never retries.

#![allow(async_fn_in_trait)]

mod error;
mod reqwest_transport;

pub use error::TransportError;
pub use reqwest::Method;
pub use reqwest::header::HeaderMap;
pub use reqwest_transport::ReqwestTransport;
pub use tokio_util::sync::CancellationToken;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one outgoing request, used to correlate logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide request ID.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Caller-chosen cache behaviour, forwarded as a `Cache-Control` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Let the server and any intermediaries decide.
    #[default]
    Default,
    /// `Cache-Control: no-store`.
    NoStore,
    /// `Cache-Control: no-cache`.
    NoCache,
}

impl CachePolicy {
    /// The `Cache-Control` value this policy maps to, if any.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::NoStore => Some("no-store"),
            Self::NoCache => Some("no-cache"),
        }
    }
}

/// A fully-resolved request: absolute URL, final headers, raw body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub id: RequestId,
    pub method: Method,
    pub url: String,
    /// Header name/value pairs in insertion order.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub cache: CachePolicy,
    /// Fires to abandon the request. Cancellation surfaces as
    /// [`TransportError::Cancelled`].
    pub cancel: Option<CancellationToken>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::next(),
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            cache: CachePolicy::Default,
            cancel: None,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The raw response, status and body untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase (`"Unauthorized"`), empty if unknown.
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Builds a response with the canonical reason phrase for `status`.
    pub fn new(status: u16) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Builder-style header setter, mostly for tests and fakes.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Builder-style body setter.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// `true` for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The `Content-Type` header, or `""` when absent.
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// Sends one request and returns the raw response.
///
/// # Contract
///
/// - Any received response, whatever its status, is `Ok`.
/// - `Err` means nothing usable came back (see [`TransportError`]).
/// - No retries, no status interpretation.
pub trait HttpTransport: Send + Sync + 'static {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Sharing a transport behind an `Arc` keeps it a transport.
impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).send(request)
    }
}
