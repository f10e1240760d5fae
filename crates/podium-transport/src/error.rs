/// Errors that can occur in the transport layer.
///
/// Every variant means "no HTTP response was received". A response with a
/// 4xx/5xx status is NOT a transport error. It is returned as an
/// [`HttpResponse`](crate::HttpResponse) and interpreted further up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established (DNS, refused, TLS).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The underlying client gave up waiting.
    #[error("request timed out")]
    Timeout,

    /// The caller's cancellation token fired before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be built (bad header name or value, bad URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure while sending or reading the response.
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Classifies a `reqwest` failure into one of our variants.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}
