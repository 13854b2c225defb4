//! Message routing for Parley.
//!
//! The [`Router`] takes a decoded [`Request`](parley_protocol::Request)
//! from an authenticated user and runs exactly one domain handler for it:
//! history paging, global/direct/group chat, friend requests, or group
//! membership. Handler failures are domain errors ([`RouterError`]) that
//! go back to the sender as an `error` event; they never close the
//! connection.
//!
//! # Key types
//!
//! - [`Router`]: dispatch plus the handlers, generic over the
//!   [`Store`](parley_store::Store)
//! - [`NotificationCenter`]: per-user alerts, pushed live or replayed at
//!   login
//! - [`RouterConfig`]: history page sizes

mod config;
mod error;
mod handlers;
mod notifications;
mod router;

pub use config::RouterConfig;
pub use error::RouterError;
pub use notifications::{Notification, NotificationCenter, NotificationKind};
pub use router::Router;
