//! Error types for the session layer.

use std::time::Duration;

use parley_protocol::{ProtocolError, UserId};
use parley_transport::TransportError;

/// Errors that can occur while delivering to or running a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The mailbox is at capacity. Point-to-point senders skip the
    /// recipient; the broadcaster evicts it.
    #[error("mailbox full for user {0}")]
    MailboxFull(UserId),

    /// The session has been torn down. Terminal: never retry.
    #[error("mailbox closed for user {0}")]
    MailboxClosed(UserId),

    /// The broadcast coordinator has stopped.
    #[error("broadcast queue closed")]
    BroadcastClosed,

    /// A single write took longer than the configured deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
