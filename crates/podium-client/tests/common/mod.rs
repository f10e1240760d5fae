//! Shared fixtures for the client integration tests.
//!
//! [`FakeServer`] is an in-process [`HttpTransport`]: a handler closure
//! decides every response and each request is recorded so tests can count
//! how often an endpoint was hit.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use podium_client::{
    ApiClient, AuthService, HeaderBuilder, RequestExecutor, SessionExpiryNotifier,
};
use podium_store::{MemoryStorage, TokenKeys, TokenStore};
use podium_transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

pub const BASE: &str = "https://api.test";
pub const REFRESH_PATH: &str = "/auth/token/refresh/";
pub const LOGIN_PATH: &str = "/auth/login/";

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// What the fake server saw for one request.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<serde_json::Value>,
}

pub struct FakeServer {
    handler: Box<Handler>,
    seen: Mutex<Vec<Seen>>,
    refresh_latency: Duration,
}

impl FakeServer {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            seen: Mutex::new(Vec::new()),
            refresh_latency: Duration::ZERO,
        }
    }

    /// Makes the refresh endpoint slow, so concurrent callers overlap.
    pub fn with_refresh_latency(mut self, latency: Duration) -> Self {
        self.refresh_latency = latency;
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.seen().iter().filter(|s| s.path == path).count()
    }

    pub fn total_hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl HttpTransport for FakeServer {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = path_of(&request);
        self.seen.lock().unwrap().push(Seen {
            method: request.method.clone(),
            path: path.clone(),
            authorization: request.header("Authorization").map(str::to_string),
            body: request
                .body
                .as_deref()
                .and_then(|b| serde_json::from_slice(b).ok()),
        });
        if path == REFRESH_PATH && !self.refresh_latency.is_zero() {
            tokio::time::sleep(self.refresh_latency).await;
        }
        (self.handler)(&request)
    }
}

pub fn path_of(request: &HttpRequest) -> String {
    request
        .url
        .strip_prefix(BASE)
        .unwrap_or(&request.url)
        .to_string()
}

pub fn bearer(request: &HttpRequest) -> Option<&str> {
    request
        .header("Authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn json(status: u16, body: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(status)
        .with_header("Content-Type", "application/json")
        .with_body(body.to_string()))
}

pub fn token_store() -> TokenStore {
    TokenStore::new(
        Arc::new(MemoryStorage::new()),
        TokenKeys::new("auth_token", "auth_refresh_token"),
    )
}

/// Counts notifier invocations.
pub fn counting_notifier() -> (SessionExpiryNotifier, Arc<AtomicUsize>) {
    let notifier = SessionExpiryNotifier::new();
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    notifier.set_session_expired_callback(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (notifier, count)
}

pub type TestClient = ApiClient<Arc<FakeServer>, Arc<AuthService<Arc<FakeServer>>>>;

/// Everything a test needs to drive and inspect one client.
pub struct Harness {
    pub server: Arc<FakeServer>,
    pub tokens: TokenStore,
    pub auth: Arc<AuthService<Arc<FakeServer>>>,
    pub client: TestClient,
    pub expired: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(server: FakeServer) -> Self {
        Self::build(server, false)
    }

    pub fn coalesced(server: FakeServer) -> Self {
        Self::build(server, true)
    }

    fn build(server: FakeServer, coalesce: bool) -> Self {
        let server = Arc::new(server);
        let tokens = token_store();
        let executor = Arc::new(RequestExecutor::new(
            BASE,
            HeaderBuilder::new(tokens.clone()),
            Arc::clone(&server),
        ));
        let auth = Arc::new(AuthService::new(Arc::clone(&executor), tokens.clone()));
        let (notifier, expired) = counting_notifier();
        let client = ApiClient::new(executor, Arc::clone(&auth), tokens.clone(), notifier)
            .with_coalesced_refresh(coalesce);
        Self {
            server,
            tokens,
            auth,
            client,
            expired,
        }
    }

    pub fn expired_count(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }
}
