//! Codec trait and the JSON implementation used for request/response bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The API client doesn't care HOW bodies are serialized; it just needs
//! something that implements the [`Codec`] trait. The backend only speaks
//! JSON, so [`JsonCodec`] is the one implementation.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// The default `Content-Type` attached to every outgoing request.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Returns `true` if a `Content-Type` header value denotes a JSON body.
///
/// Matches on substring (case-insensitively), so
/// `application/json; charset=utf-8` is accepted too.
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .to_ascii_lowercase()
        .contains(JSON_CONTENT_TYPE)
}

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between tasks (Tokio may poll the
///   API client from any worker thread).
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-lived `Arc`s.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Produces the value a successful response WITHOUT a body decodes to.
    ///
    /// `204 No Content` and non-JSON success responses carry nothing the
    /// caller can parse, so they resolve to "an empty object" instead.
    fn empty<T: DeserializeOwned>(&self) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use podium_protocol::{Codec, Credentials, JsonCodec};
///
/// let codec = JsonCodec;
/// let creds = Credentials::new("admin@paris2024.org", "s3cret");
///
/// let bytes = codec.encode(&creds).unwrap();
/// let back: Credentials = codec.decode(&bytes).unwrap();
/// assert_eq!(back, creds);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn empty<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        // Most callers expect an object (`{}` decodes into any struct whose
        // fields all have defaults, or into `serde_json::Value`). Unit and
        // `Option` callers only accept `null`, so fall back to that.
        let object = serde_json::Value::Object(serde_json::Map::new());
        serde_json::from_value(object)
            .or_else(|_| serde_json::from_value(serde_json::Value::Null))
            .map_err(ProtocolError::Decode)
    }
}

// =========================================================================
// Tests
// =========================================================================
