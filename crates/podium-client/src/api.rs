//! The API client: `fetch_api` and its 401 → refresh → retry-once flow.
//!
//! ```text
//!  fetch_api ──→ make_request ──→ 401 && requires_auth?
//!                                   │ no                 │ yes
//!                                   ▼                    ▼
//!                              decode_response     refresh_token()
//!                                                   │ ok        │ err
//!                                                   ▼           ▼
//!                                   broadcast TokenRefreshed   clear tokens
//!                                   make_request (same opts)   notify expired
//!                                   decode_response            Err(SessionExpired)
//! ```
//!
//! Per call there is at most one refresh and at most one retry, whatever
//! the server keeps answering. A second 401 after the retry is returned
//! to the caller as an ordinary [`HttpError`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use podium_protocol::{Codec, JsonCodec, error_detail, is_json_content_type};
use podium_store::TokenStore;
use podium_transport::{HttpResponse, HttpTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::auth::TokenRefresher;
use crate::executor::{RequestExecutor, RequestOptions};
use crate::notifier::SessionExpiryNotifier;
use crate::{ApiError, HttpError};

/// Capacity of the auth event channel. Slow subscribers that fall this
/// far behind get `RecvError::Lagged` and skip ahead.
const EVENT_CAPACITY: usize = 16;

/// Broadcast to anyone who subscribed via [`ApiClient::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A 401 was recovered by minting a new access token.
    TokenRefreshed,
}

/// Serializes concurrent refreshes when coalescing is enabled.
///
/// `generation` counts successful refreshes. A caller remembers the
/// generation before sending its request; if it changed by the time the
/// caller holds the lock, someone else already refreshed and the caller
/// can retry straight away.
#[derive(Debug, Default)]
struct RefreshGate {
    lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refreshed {
    ByThisCall,
    ByConcurrentCall,
}

/// The request/response orchestrator every resource service goes through.
pub struct ApiClient<T: HttpTransport, R: TokenRefresher> {
    executor: Arc<RequestExecutor<T>>,
    refresher: R,
    tokens: TokenStore,
    notifier: SessionExpiryNotifier,
    events: broadcast::Sender<AuthEvent>,
    gate: Option<RefreshGate>,
}

impl<T: HttpTransport, R: TokenRefresher> ApiClient<T, R> {
    pub fn new(
        executor: Arc<RequestExecutor<T>>,
        refresher: R,
        tokens: TokenStore,
        notifier: SessionExpiryNotifier,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            executor,
            refresher,
            tokens,
            notifier,
            events,
            gate: None,
        }
    }

    /// Lets concurrent 401s share one refresh instead of each running
    /// their own.
    pub fn with_coalesced_refresh(mut self, enabled: bool) -> Self {
        self.gate = enabled.then(RefreshGate::default);
        self
    }

    /// Subscribes to [`AuthEvent`]s.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn notifier(&self) -> &SessionExpiryNotifier {
        &self.notifier
    }

    /// Sends a request and decodes the JSON response into `D`.
    ///
    /// # Errors
    /// - [`ApiError::Network`] if no response arrived.
    /// - [`ApiError::SessionExpired`] if a 401 could not be refreshed
    ///   away. Tokens are cleared and the notifier has fired.
    /// - [`ApiError::Http`] for any other non-2xx (including a 401 on the
    ///   retry, or any 401 when `requires_auth` is false).
    /// - [`ApiError::Codec`] if a JSON success body doesn't fit `D`.
    pub async fn fetch_api<D: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        requires_auth: bool,
    ) -> Result<D, ApiError> {
        let generation = self.generation();
        let mut response = self
            .executor
            .make_request(endpoint, options, requires_auth)
            .await?;

        if response.status == 401 && requires_auth {
            tracing::debug!(endpoint, "401 received, attempting token refresh");
            match self.refresh_once(generation).await {
                Ok(how) => {
                    if how == Refreshed::ByThisCall {
                        // No subscribers is fine.
                        let _ = self.events.send(AuthEvent::TokenRefreshed);
                    }
                    response = self
                        .executor
                        .make_request(endpoint, options, requires_auth)
                        .await?;
                }
                Err(cause) => {
                    tracing::warn!(endpoint, error = %cause, "token refresh failed, session expired");
                    self.tokens.clear_tokens();
                    self.notifier.notify_session_expired();
                    return Err(ApiError::SessionExpired(Box::new(cause)));
                }
            }
        }

        decode_response(response)
    }

    fn generation(&self) -> u64 {
        self.gate
            .as_ref()
            .map(|gate| gate.generation.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    async fn refresh_once(&self, seen_generation: u64) -> Result<Refreshed, ApiError> {
        let Some(gate) = &self.gate else {
            self.refresher.refresh_token().await?;
            return Ok(Refreshed::ByThisCall);
        };

        let _held = gate.lock.lock().await;
        if gate.generation.load(Ordering::Acquire) != seen_generation {
            tracing::debug!("token already refreshed by a concurrent request");
            return Ok(Refreshed::ByConcurrentCall);
        }
        self.refresher.refresh_token().await?;
        gate.generation.fetch_add(1, Ordering::AcqRel);
        Ok(Refreshed::ByThisCall)
    }

    // -- Resource helpers -------------------------------------------------

    /// Authenticated `GET`.
    pub async fn get<D: DeserializeOwned>(&self, endpoint: &str) -> Result<D, ApiError> {
        self.fetch_api(endpoint, &RequestOptions::get(), true).await
    }

    /// Authenticated `POST` with a JSON body.
    pub async fn post<B: Serialize, D: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<D, ApiError> {
        let options = RequestOptions::post().json(body)?;
        self.fetch_api(endpoint, &options, true).await
    }

    /// Authenticated `PUT` with a JSON body.
    pub async fn put<B: Serialize, D: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<D, ApiError> {
        let options = RequestOptions::put().json(body)?;
        self.fetch_api(endpoint, &options, true).await
    }

    /// Authenticated `PATCH` with a JSON body.
    pub async fn patch<B: Serialize, D: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<D, ApiError> {
        let options = RequestOptions::patch().json(body)?;
        self.fetch_api(endpoint, &options, true).await
    }

    /// Authenticated `DELETE`. Most endpoints answer `204`, which decodes
    /// into `()` or an empty object.
    pub async fn delete<D: DeserializeOwned>(&self, endpoint: &str) -> Result<D, ApiError> {
        self.fetch_api(endpoint, &RequestOptions::delete(), true).await
    }
}

/// Turns a raw response into `D` or a typed error.
///
/// Non-2xx: `HttpError` with `"(<status>) <detail | status text>"` and the
/// JSON body (or `{}`) attached. 2xx with a JSON content type and a body:
/// decoded. Anything else (204, empty or non-JSON bodies): the codec's
/// empty value.
pub(crate) fn decode_response<D: DeserializeOwned>(response: HttpResponse) -> Result<D, ApiError> {
    let codec = JsonCodec;
    let is_json = is_json_content_type(response.content_type());

    if !response.ok() {
        let data = if is_json {
            codec
                .decode::<serde_json::Value>(&response.body)
                .unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };
        let detail = error_detail(&data)
            .map(str::to_string)
            .unwrap_or_else(|| response.status_text.clone());
        tracing::debug!(status = response.status, %detail, "request failed");
        return Err(HttpError {
            status: response.status,
            message: format!("({}) {}", response.status, detail),
            data,
        }
        .into());
    }

    if is_json && !response.body.is_empty() {
        Ok(codec.decode(&response.body)?)
    } else {
        Ok(codec.empty()?)
    }
}

// =========================================================================
// Tests
// =========================================================================
