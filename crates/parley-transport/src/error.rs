use std::io;

/// Errors from the socket and the framing on top of it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a connection failed.
    #[error("listener error: {0}")]
    AcceptFailed(#[source] io::Error),

    #[error("read failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    #[error("write failed: {0}")]
    SendFailed(#[source] io::Error),

    /// A line longer than the frame limit, in either direction.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    /// Outbound bytes that can't travel as one line.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
