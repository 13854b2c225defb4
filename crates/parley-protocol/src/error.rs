//! Error types for the protocol layer.
//!
//! Decoding happens in two steps, and the error variants mirror that:
//! [`Decode`](ProtocolError::Decode) means the frame was not a valid
//! envelope at all, while [`InvalidPayload`](ProtocolError::InvalidPayload)
//! and [`Unsupported`](ProtocolError::Unsupported) mean the envelope was
//! fine but its contents could not be turned into a request.

use crate::MessageType;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes were not a well-formed envelope.
    ///
    /// On an established connection this is fatal: the stream can no
    /// longer be trusted to be in sync.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope decoded, but its payload does not match the shape
    /// its type tag calls for.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },

    /// The type tag is unknown, or is one a client is not allowed to send.
    #[error("unsupported message type: {0}")]
    Unsupported(MessageType),

    /// The message is invalid at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Returns `true` if the error leaves the connection usable.
    ///
    /// Envelope-level decode failures are not recoverable; a bad or
    /// unknown payload only affects the one message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidPayload { .. }
                | ProtocolError::Unsupported(_)
                | ProtocolError::InvalidMessage(_)
        )
    }
}
