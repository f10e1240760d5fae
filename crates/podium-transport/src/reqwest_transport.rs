//! HTTP transport implementation using `reqwest`.

use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue};

use crate::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// A [`HttpTransport`] backed by a pooled `reqwest::Client`.
///
/// Cloning is cheap: `reqwest::Client` is an `Arc` internally, so clones
/// share one connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a pre-configured client (proxies, root certificates, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &HttpRequest) -> Result<reqwest::Request, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }
        if let Some(policy) = request.cache.header_value() {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(policy));
        }

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder.build().map_err(TransportError::from_reqwest)
    }

    async fn round_trip(&self, request: reqwest::Request) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(TransportError::from_reqwest)?
            .to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let id = request.id;
        let built = self.build(&request)?;
        tracing::debug!(%id, method = %request.method, url = %request.url, "sending request");

        let response = match &request.cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(%id, "request cancelled by caller");
                        return Err(TransportError::Cancelled);
                    }
                    result = self.round_trip(built) => result?,
                }
            }
            None => self.round_trip(built).await?,
        };

        tracing::debug!(%id, status = response.status, "received response");
        Ok(response)
    }
}
