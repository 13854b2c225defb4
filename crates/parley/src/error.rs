//! Unified error type for the Parley server.

use std::time::Duration;

use parley_protocol::{MessageType, ProtocolError};
use parley_router::RouterError;
use parley_session::SessionError;
use parley_store::StoreError;
use parley_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` variants let `?` convert sub-crate errors directly. The
/// remaining variants are handshake failures: each one means the
/// connection is closed without a session ever being registered.
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Router(#[from] RouterError),

    /// No `auth` message arrived in time.
    #[error("no auth message within {0:?}")]
    AuthTimeout(Duration),

    /// The peer hung up before authenticating.
    #[error("connection closed before auth")]
    HandshakeClosed,

    /// The first message wasn't `auth`.
    #[error("expected auth, got {0}")]
    ExpectedAuth(MessageType),

    /// The store refused the credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),
}

#[cfg(test)]
mod tests {
    use parley_protocol::UserId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: ParleyError = TransportError::FrameTooLong { limit: 16 }.into();
        assert!(matches!(err, ParleyError::Transport(_)));
        assert!(err.to_string().contains("16"));
    }

    #[test]
    fn test_from_store_error() {
        let err: ParleyError = StoreError::InvalidCredentials.into();
        assert!(matches!(err, ParleyError::Store(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: ParleyError = SessionError::MailboxFull(UserId::new()).into();
        assert!(matches!(err, ParleyError::Session(_)));
    }

    #[test]
    fn test_from_router_error() {
        let err: ParleyError = RouterError::InvalidRequest("nope".into()).into();
        assert!(matches!(err, ParleyError::Router(_)));
    }

    #[test]
    fn test_auth_timeout_display() {
        let err = ParleyError::AuthTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "no auth message within 30s");
    }
}
