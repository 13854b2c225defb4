//! The client registry: who is online right now.
//!
//! Maps each user to their one live [`Session`]. It is the only
//! long-lived structure mutated from many tasks, so every access goes
//! through these methods and the map itself is never handed out.
//!
//! # Replacement
//!
//! A second login for the same user replaces the first. The new session is
//! inserted *before* the old one is closed, so there is never a moment
//! with zero or two live sessions for that user.
//!
//! # Stale teardown
//!
//! When an old session's pumps finally notice they were closed, they call
//! [`unregister`](Registry::unregister) with their own `Arc`. By then the
//! slot belongs to the replacement, so the call does nothing.

use std::collections::HashMap;
use std::sync::Arc;

use parley_protocol::UserId;
use tokio::sync::RwLock;

use crate::Session;

/// Concurrency-safe map from user id to live session.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: RwLock<HashMap<UserId, Arc<Session>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `session` for its user, closing any session it replaces.
    ///
    /// Returns the replaced session, if there was one.
    pub async fn register(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let user_id = session.user_id();
        let previous = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(user_id, Arc::clone(&session))
        };

        match previous {
            Some(old) if !Arc::ptr_eq(&old, &session) => {
                old.close();
                tracing::info!(
                    %user_id,
                    old_conn = %old.conn_id(),
                    new_conn = %session.conn_id(),
                    "session replaced"
                );
                Some(old)
            }
            _ => {
                tracing::debug!(%user_id, conn_id = %session.conn_id(), "session registered");
                None
            }
        }
    }

    /// Returns the user's live session, if any.
    pub async fn lookup(&self, user_id: UserId) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Removes the user's entry, but only if it still is `expected`.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn unregister(&self, user_id: UserId, expected: &Arc<Session>) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&user_id) {
            Some(current) if Arc::ptr_eq(current, expected) => {
                sessions.remove(&user_id);
                tracing::debug!(%user_id, conn_id = %expected.conn_id(), "session unregistered");
                true
            }
            _ => false,
        }
    }

    /// A point-in-time copy of every live session, for fan-out.
    pub async fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.sessions.read().await.contains_key(&user_id)
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
