//! Transport layer for Parley.
//!
//! Provides the [`Transport`] trait for accepting connections, the
//! [`TcpTransport`] implementation, and the [`FrameReader`] /
//! [`FrameWriter`] halves that turn a byte stream into discrete frames.
//!
//! Frames are newline-delimited. The protocol layer above guarantees that
//! an encoded message never contains a raw newline, so one line is always
//! exactly one message and a partial read simply waits for the rest of it.

#![allow(async_fn_in_trait)]

mod error;
mod framing;
mod tcp;

pub use error::TransportError;
pub use framing::{FrameReader, FrameWriter, MAX_FRAME_LEN};
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

/// Identifies one accepted socket for logging. Assigned from a process-wide
/// counter, so ids are never reused while the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Produces accepted connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Send + 'static;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The bound address. Useful after binding to port 0.
    fn local_addr(&self) -> Result<std::net::SocketAddr, Self::Error>;
}
