//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and the bytes of one frame. The
//! framing itself (where one frame ends and the next begins) belongs to
//! the transport; the codec only promises that its output never contains
//! the frame delimiter.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a single codec value can be shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into the bytes of one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses compact JSON (via `serde_json`).
///
/// Compact output escapes control characters inside strings, so an
/// encoded value is always a single line and fits newline framing.
///
/// ## Example
///
/// ```rust
/// use parley_protocol::{Codec, Envelope, JsonCodec, MessageType};
///
/// let codec = JsonCodec;
/// let envelope = Envelope::new(MessageType::Ping, serde_json::Value::Null);
///
/// let bytes = codec.encode(&envelope).unwrap();
/// assert!(!bytes.contains(&b'\n'));
///
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
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
}
