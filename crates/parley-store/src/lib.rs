//! Persistence for Parley.
//!
//! The [`Store`] trait is the contract the rest of the server codes
//! against: users and credentials, chat messages, groups, and friend
//! requests. [`MemoryStore`] implements it in process memory.
//!
//! ```text
//! Router (handlers) → Store trait → MemoryStore | your database
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod memory;
mod models;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{
    Audience, FriendRequest, FriendRequestStatus, Group, GroupMember, GroupStatus, MemberRole,
    Message, NewMessage, User,
};
pub use store::Store;
