//! The presence state machine, without side effects.
//!
//! ```text
//!   offline ──(login)──→ online ──(idle)──→ away
//!      ↑                  │  ↑               │
//!      │                  │  └──(activity)───┘
//!      └───(teardown)─────┴──────────────────┘
//! ```
//!
//! Every method returns the [`Transition`] it caused, or `None` when the
//! status didn't actually change, so callers only announce real changes.

use std::collections::HashMap;
use std::time::Duration;

use parley_protocol::{UserId, UserStatus};
use tokio::time::Instant;

/// A status change for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub user_id: UserId,
    pub from: UserStatus,
    pub to: UserStatus,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: UserStatus,
    last_activity: Instant,
}

/// In-memory presence for every user that has a live session.
///
/// Users with no entry are offline.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    entries: HashMap<UserId, Entry>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, user_id: UserId) -> UserStatus {
        self.entries
            .get(&user_id)
            .map(|e| e.status)
            .unwrap_or(UserStatus::Offline)
    }

    /// Marks the user online after a successful login.
    pub fn set_online(&mut self, user_id: UserId, now: Instant) -> Option<Transition> {
        let entry = self.entries.entry(user_id).or_insert(Entry {
            status: UserStatus::Offline,
            last_activity: now,
        });
        entry.last_activity = now;
        change(user_id, &mut entry.status, UserStatus::Online)
    }

    /// Records inbound activity. Brings an away user back online.
    ///
    /// Activity from a user with no entry is ignored: only login makes a
    /// user present.
    pub fn touch(&mut self, user_id: UserId, now: Instant) -> Option<Transition> {
        let entry = self.entries.get_mut(&user_id)?;
        entry.last_activity = now;
        if entry.status == UserStatus::Away {
            change(user_id, &mut entry.status, UserStatus::Online)
        } else {
            None
        }
    }

    /// Forgets the user.
    pub fn set_offline(&mut self, user_id: UserId) -> Option<Transition> {
        let entry = self.entries.remove(&user_id)?;
        let mut status = entry.status;
        change(user_id, &mut status, UserStatus::Offline)
    }

    /// Demotes every online user idle for longer than `away_after`.
    pub fn sweep(&mut self, now: Instant, away_after: Duration) -> Vec<Transition> {
        self.entries
            .iter_mut()
            .filter(|(_, e)| {
                e.status == UserStatus::Online
                    && now.saturating_duration_since(e.last_activity) > away_after
            })
            .filter_map(|(&user_id, e)| change(user_id, &mut e.status, UserStatus::Away))
            .collect()
    }

    /// Number of users currently online or away.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn change(user_id: UserId, status: &mut UserStatus, to: UserStatus) -> Option<Transition> {
    if *status == to {
        return None;
    }
    let from = std::mem::replace(status, to);
    Some(Transition { user_id, from, to })
}
