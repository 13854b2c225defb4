//! The presence service: applies transitions and announces them.

use std::sync::Arc;

use parley_protocol::{Event, StatusUpdate, UserId, UserStatus};
use parley_session::{Broadcaster, Registry};
use parley_store::Store;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{PresenceConfig, PresenceTracker, Transition};

/// Owns the [`PresenceTracker`] and performs the side effects of each
/// transition: persist the new status, then publish one `status_update`.
///
/// The tracker lock is held while effects run, so announcements for a
/// given user go out in the order the transitions happened.
pub struct Presence<S: Store> {
    tracker: Mutex<PresenceTracker>,
    store: Arc<S>,
    broadcaster: Broadcaster,
    config: PresenceConfig,
}

impl<S: Store> Presence<S> {
    pub fn new(store: Arc<S>, broadcaster: Broadcaster, config: PresenceConfig) -> Self {
        Self {
            tracker: Mutex::new(PresenceTracker::new()),
            store,
            broadcaster,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    pub async fn status(&self, user_id: UserId) -> UserStatus {
        self.tracker.lock().await.status(user_id)
    }

    /// Marks the user online after a successful handshake.
    pub async fn online(&self, user_id: UserId) {
        let mut tracker = self.tracker.lock().await;
        let transition = tracker.set_online(user_id, Instant::now());
        self.apply(transition).await;
    }

    /// Records inbound activity from the user.
    pub async fn activity(&self, user_id: UserId) {
        let mut tracker = self.tracker.lock().await;
        let transition = tracker.touch(user_id, Instant::now());
        self.apply(transition).await;
    }

    /// Marks the user offline unless a live session for them is still
    /// registered.
    ///
    /// The registry is checked under the tracker lock, so a teardown
    /// racing a fresh login can't leave a connected user shown offline.
    pub async fn offline_unless_registered(&self, user_id: UserId, registry: &Registry) {
        let mut tracker = self.tracker.lock().await;
        if registry.is_online(user_id).await {
            debug!(%user_id, "newer session registered, staying online");
            return;
        }
        let transition = tracker.set_offline(user_id);
        self.apply(transition).await;
    }

    /// Demotes idle users to away. Returns how many were demoted.
    pub async fn sweep(&self) -> usize {
        let mut tracker = self.tracker.lock().await;
        let transitions = tracker.sweep(Instant::now(), self.config.away_after);
        let count = transitions.len();
        for transition in transitions {
            self.apply(Some(transition)).await;
        }
        count
    }

    /// Runs the periodic sweep until `shutdown` is cancelled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let period = self.config.sweep_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(?period, "presence monitor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let demoted = self.sweep().await;
                    if demoted > 0 {
                        debug!(demoted, "presence sweep");
                    }
                }
            }
        }
        debug!("presence monitor stopped");
    }

    async fn apply(&self, transition: Option<Transition>) {
        let Some(Transition { user_id, from, to }) = transition else {
            return;
        };
        info!(%user_id, %from, %to, "presence changed");

        if let Err(e) = self.store.update_user_status(user_id, to).await {
            warn!(%user_id, error = %e, "failed to persist status");
        }
        let event = Event::StatusUpdate(StatusUpdate { user_id, status: to });
        if let Err(e) = self.broadcaster.publish(event).await {
            warn!(%user_id, error = %e, "failed to publish status update");
        }
    }
}
