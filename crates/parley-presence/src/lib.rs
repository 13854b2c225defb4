//! Presence for Parley: who is online, away, or offline.
//!
//! [`PresenceTracker`] is the pure state machine. [`Presence`] wraps it
//! with the side effects (store update, `status_update` broadcast) and
//! runs the periodic idle sweep that demotes quiet users to away.
//!
//! Presence is advisory. An away user keeps their session and mailbox
//! and receives everything as before.

mod config;
mod service;
mod tracker;

pub use config::PresenceConfig;
pub use service::Presence;
pub use tracker::{PresenceTracker, Transition};
