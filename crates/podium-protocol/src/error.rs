//! Error types for the protocol layer.
//!
//! Each crate in Podium defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in (de)serializing a body,
//! not in networking or session management.

/// Errors that can occur while encoding or decoding an HTTP body.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into a request body).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed (turning a response body into a Rust value).
    ///
    /// Common causes: malformed JSON, missing required fields, or the
    /// server answering with a shape the caller did not expect.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
