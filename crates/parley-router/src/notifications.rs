//! Per-user out-of-band alerts.
//!
//! A [`Notification`] records something a user should hear about even if
//! they weren't connected when it happened: a friend request, an answer
//! to one, being added to a group. Entries live in memory, are pushed
//! live when the user is online, and are replayed after their next login
//! until read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_protocol::{Event, NotificationPayload, UserId};
use parley_session::Registry;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    FriendRequest,
    FriendResponse,
    GroupInvite,
    NewMessage,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::FriendResponse => "friend_response",
            NotificationKind::GroupInvite => "group_invite",
            NotificationKind::NewMessage => "new_message",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub user_id: UserId,
    pub message: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// The `notification` event the client sees.
    pub fn to_event(&self) -> Event {
        Event::Notification(NotificationPayload {
            kind: self.kind.as_str().to_string(),
            message: self.message.clone(),
            data: self.data.clone(),
        })
    }
}

/// In-memory notification lists, one per user.
pub struct NotificationCenter {
    entries: Mutex<HashMap<UserId, Vec<Notification>>>,
    registry: Arc<Registry>,
}

impl NotificationCenter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            registry,
        }
    }

    /// Records a notification and pushes it if the user is online.
    ///
    /// A notification that reached a live mailbox is stored as read, so
    /// it isn't replayed at the next login.
    pub async fn add(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        data: Value,
    ) {
        let mut notification = Notification {
            kind,
            user_id,
            message: message.into(),
            data,
            timestamp: Utc::now(),
            read: false,
        };

        if let Some(session) = self.registry.lookup(user_id).await {
            notification.read = session.deliver(notification.to_event());
        }
        debug!(%user_id, %kind, delivered = notification.read, "notification recorded");

        self.entries
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .push(notification);
    }

    pub async fn unread_count(&self, user_id: UserId) -> usize {
        self.entries
            .lock()
            .await
            .get(&user_id)
            .map_or(0, |list| list.iter().filter(|n| !n.read).count())
    }

    /// Marks every unread notification of `kind` as read. Returns how many
    /// changed.
    pub async fn mark_read(&self, user_id: UserId, kind: NotificationKind) -> usize {
        let mut entries = self.entries.lock().await;
        let Some(list) = entries.get_mut(&user_id) else {
            return 0;
        };
        let mut changed = 0;
        for n in list.iter_mut().filter(|n| n.kind == kind && !n.read) {
            n.read = true;
            changed += 1;
        }
        changed
    }

    /// Everything recorded for the user, oldest first.
    pub async fn list(&self, user_id: UserId) -> Vec<Notification> {
        self.entries
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the user's unread notifications, skipping the `except`
    /// kinds, and marks the returned ones read.
    pub async fn take_unread(
        &self,
        user_id: UserId,
        except: &[NotificationKind],
    ) -> Vec<Notification> {
        let mut entries = self.entries.lock().await;
        let Some(list) = entries.get_mut(&user_id) else {
            return Vec::new();
        };
        list.iter_mut()
            .filter(|n| !n.read && !except.contains(&n.kind))
            .map(|n| {
                n.read = true;
                n.clone()
            })
            .collect()
    }

    /// Drops notifications older than `retention`. Returns how many went.
    pub async fn prune_older_than(&self, retention: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };

        let mut entries = self.entries.lock().await;
        let mut removed = 0;
        entries.retain(|_, list| {
            let before = list.len();
            list.retain(|n| n.timestamp >= cutoff);
            removed += before - list.len();
            !list.is_empty()
        });
        removed
    }

    /// Prunes every `interval` until `shutdown` is cancelled.
    pub async fn run_pruner(
        self: Arc<Self>,
        interval: Duration,
        retention: Duration,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(?interval, ?retention, "notification pruner started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = self.prune_older_than(retention).await;
                    if removed > 0 {
                        debug!(removed, "pruned notifications");
                    }
                }
            }
        }
        debug!("notification pruner stopped");
    }
}

#[cfg(test)]
mod tests {
    use parley_session::Session;
    use parley_transport::ConnectionId;
    use serde_json::json;

    use super::*;

    fn center() -> (NotificationCenter, Arc<Registry>) {
        let registry = Arc::new(Registry::new());
        (NotificationCenter::new(Arc::clone(&registry)), registry)
    }

    #[tokio::test]
    async fn test_add_offline_user_stays_unread() {
        let (center, _registry) = center();
        let user = UserId::new();

        center
            .add(user, NotificationKind::GroupInvite, "added to rust", json!({}))
            .await;

        assert_eq!(center.unread_count(user).await, 1);
        assert_eq!(center.list(user).await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_online_user_pushes_and_marks_read() {
        let (center, registry) = center();
        let user = UserId::new();
        let (session, mut mailbox) =
            Session::new(ConnectionId::new(1), user, "alice", 8, &CancellationToken::new());
        registry.register(session).await;

        center
            .add(user, NotificationKind::FriendResponse, "bob accepted", json!({"x": 1}))
            .await;

        let event = mailbox.try_recv().expect("notification should be pushed");
        let Event::Notification(payload) = &*event else {
            panic!("expected notification, got {event:?}");
        };
        assert_eq!(payload.kind, "friend_response");
        assert_eq!(payload.message, "bob accepted");
        assert_eq!(center.unread_count(user).await, 0);
    }

    #[tokio::test]
    async fn test_take_unread_skips_excluded_kinds() {
        let (center, _registry) = center();
        let user = UserId::new();
        center
            .add(user, NotificationKind::FriendRequest, "from bob", Value::Null)
            .await;
        center
            .add(user, NotificationKind::GroupInvite, "added", Value::Null)
            .await;

        let taken = center
            .take_unread(user, &[NotificationKind::FriendRequest])
            .await;

        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].kind, NotificationKind::GroupInvite);
        assert_eq!(center.unread_count(user).await, 1);
        assert!(center.take_unread(user, &[NotificationKind::FriendRequest]).await.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_only_touches_kind() {
        let (center, _registry) = center();
        let user = UserId::new();
        center
            .add(user, NotificationKind::NewMessage, "one", Value::Null)
            .await;
        center
            .add(user, NotificationKind::NewMessage, "two", Value::Null)
            .await;
        center
            .add(user, NotificationKind::GroupInvite, "three", Value::Null)
            .await;

        assert_eq!(center.mark_read(user, NotificationKind::NewMessage).await, 2);
        assert_eq!(center.unread_count(user).await, 1);
    }

    #[tokio::test]
    async fn test_prune_older_than_keeps_recent() {
        let (center, _registry) = center();
        let user = UserId::new();
        center
            .add(user, NotificationKind::NewMessage, "fresh", Value::Null)
            .await;

        assert_eq!(center.prune_older_than(Duration::from_secs(3600)).await, 0);
        // Backdate it past any retention window.
        center.entries.lock().await.get_mut(&user).unwrap()[0].timestamp =
            Utc::now() - chrono::Duration::days(30);

        assert_eq!(center.prune_older_than(Duration::from_secs(3600)).await, 1);
        assert!(center.list(user).await.is_empty());
    }
}
