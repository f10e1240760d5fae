//! The request executor: base URL + headers + caller options → transport.

use podium_protocol::{Codec, JsonCodec, ProtocolError};
use podium_transport::{
    CachePolicy, CancellationToken, HttpRequest, HttpResponse, HttpTransport, Method,
    TransportError,
};
use serde::Serialize;

use crate::headers::{HeaderBuilder, HeaderInput};

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

/// Everything about a request except its URL and auth header.
///
/// Options are borrowed, not consumed, by the executor: the API client
/// replays the exact same options when it retries after a refresh.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers; they override the JSON default.
    pub headers: Option<HeaderInput>,
    pub body: Option<Vec<u8>>,
    pub cache: CachePolicy,
    /// Forwarded to the transport. It does not cancel a refresh already
    /// in flight.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = Some(match self.headers.take() {
            Some(existing) => existing.push(name, value),
            None => HeaderInput::Pairs(vec![(name.into(), value.into())]),
        });
        self
    }

    pub fn headers(mut self, headers: impl Into<HeaderInput>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, ProtocolError> {
        let bytes = JsonCodec.encode(value)?;
        Ok(self.body(bytes))
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ---------------------------------------------------------------------------
// RequestExecutor
// ---------------------------------------------------------------------------

/// Issues requests against the configured base URL.
///
/// Returns raw responses; status codes are the API client's business.
/// Transport failures propagate untouched and nothing is retried here.
#[derive(Debug)]
pub struct RequestExecutor<T: HttpTransport> {
    base_url: String,
    headers: HeaderBuilder,
    transport: T,
}

impl<T: HttpTransport> RequestExecutor<T> {
    /// `base_url` must not end with `/` (see
    /// [`ClientConfig`](crate::ClientConfig), which guarantees it).
    pub fn new(base_url: impl Into<String>, headers: HeaderBuilder, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            headers,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `users` and `/users` both become `<base>/users`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn make_request(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        requires_auth: bool,
    ) -> Result<HttpResponse, TransportError> {
        let headers = self
            .headers
            .build_headers(requires_auth, options.headers.clone());

        let mut request = HttpRequest::new(options.method.clone(), self.url_for(endpoint));
        request.headers = headers.into_pairs();
        request.body = options.body.clone();
        request.cache = options.cache;
        request.cancel = options.cancel.clone();

        tracing::debug!(
            id = %request.id,
            method = %request.method,
            endpoint,
            requires_auth,
            "issuing request"
        );
        self.transport.send(request).await
    }
}

// =========================================================================
// Tests
// =========================================================================
