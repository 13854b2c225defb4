//! # Parley
//!
//! A multi-user chat server over plain TCP.
//!
//! Clients connect, authenticate with a username and password (the first
//! login for a name creates the account), and then exchange newline-framed
//! JSON envelopes: global chat, direct messages, group chat, friend
//! requests, and presence updates.
//!
//! Each connection runs two pumps: an inbound pump that feeds the router
//! one message at a time, and an outbound pump that drains the session's
//! bounded mailbox to the socket. Broadcasts go through a single
//! coordinator that never waits on a slow client; a client whose mailbox
//! is full when a broadcast arrives is disconnected instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::prelude::*;
//!
//! # async fn start() -> Result<(), ParleyError> {
//! let server = ParleyServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build(MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod auth;
mod config;
mod connection;
mod error;
mod server;

pub use config::ServerConfig;
pub use error::ParleyError;
pub use server::{ParleyServer, ParleyServerBuilder};

/// Everything needed to run a server or talk to one.
pub mod prelude {
    pub use crate::{ParleyError, ParleyServer, ParleyServerBuilder, ServerConfig};
    pub use parley_presence::PresenceConfig;
    pub use parley_protocol::{
        Codec, Envelope, ErrorCode, Event, JsonCodec, MessageType, Request, UserId, UserStatus,
    };
    pub use parley_router::RouterConfig;
    pub use parley_session::SessionConfig;
    pub use parley_store::{MemoryStore, Store, StoreError};
}
