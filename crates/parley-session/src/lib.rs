//! Live session management for Parley.
//!
//! This crate owns everything about connections that have already
//! authenticated:
//!
//! 1. **Sessions** ([`Session`], [`Mailbox`]): one per live connection,
//!    with a bounded outbound queue and a one-shot close.
//! 2. **Registry** ([`Registry`]): who is online, one session per user.
//! 3. **Fan-out** ([`Broadcaster`], [`BroadcastCoordinator`]): deliver
//!    one event to everyone without waiting on anyone.
//! 4. **Outbound pump** ([`run_outbound`]): mailbox to socket, with
//!    write deadlines and idle pings.
//!
//! ```text
//! Router (above)  ← looks sessions up, enqueues events
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol + Transport (below)  ← encode events, write frames
//! ```

mod broadcast;
mod config;
mod error;
mod outbound;
mod registry;
mod session;

pub use broadcast::{BroadcastCoordinator, Broadcaster, FanOut, broadcast_channel};
pub use config::SessionConfig;
pub use error::SessionError;
pub use outbound::{run_outbound, write_event};
pub use registry::Registry;
pub use session::{Mailbox, Session};
