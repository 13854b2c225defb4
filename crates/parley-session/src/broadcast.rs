//! Broadcast fan-out.
//!
//! Producers push events for "everyone" onto one shared queue through a
//! [`Broadcaster`] handle. A single [`BroadcastCoordinator`] task drains
//! the queue and copies each event into every registered session's
//! mailbox.
//!
//! The coordinator never waits on a recipient. If a mailbox is full, that
//! session is treated as unresponsive: it is removed from the registry and
//! closed, and the coordinator moves on. One slow client can lose its
//! connection, but it can't stall delivery to everyone else.

use std::sync::Arc;

use parley_protocol::Event;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{Registry, SessionError};

/// Creates a connected broadcaster / coordinator pair.
pub fn broadcast_channel(
    capacity: usize,
    registry: Arc<Registry>,
) -> (Broadcaster, BroadcastCoordinator) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Broadcaster { tx }, BroadcastCoordinator { rx, registry })
}

/// Cloneable handle for publishing to every connected user.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: mpsc::Sender<Arc<Event>>,
}

impl Broadcaster {
    /// Queues an event for fan-out, waiting if the shared queue is full.
    ///
    /// # Errors
    /// [`SessionError::BroadcastClosed`] if the coordinator has stopped.
    pub async fn publish(&self, event: impl Into<Arc<Event>>) -> Result<(), SessionError> {
        self.tx
            .send(event.into())
            .await
            .map_err(|_| SessionError::BroadcastClosed)
    }
}

/// What happened to one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOut {
    /// Sessions the event was queued for.
    pub delivered: usize,
    /// Sessions torn down because their mailbox was full.
    pub evicted: usize,
}

/// The single task that drains the shared queue.
pub struct BroadcastCoordinator {
    rx: mpsc::Receiver<Arc<Event>>,
    registry: Arc<Registry>,
}

impl BroadcastCoordinator {
    /// Runs until `shutdown` is cancelled or every [`Broadcaster`] is
    /// dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::debug!("broadcast coordinator started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                next = self.rx.recv() => match next {
                    Some(event) => {
                        self.fan_out(event).await;
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("broadcast coordinator stopped");
    }

    /// Copies one event into every registered session's mailbox.
    pub async fn fan_out(&self, event: Arc<Event>) -> FanOut {
        let mut report = FanOut::default();
        let mut slow = Vec::new();

        for session in self.registry.snapshot().await {
            match session.try_send(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(SessionError::MailboxFull(_)) => slow.push(session),
                // Already tearing itself down.
                Err(_) => {}
            }
        }

        for session in slow {
            let user_id = session.user_id();
            self.registry.unregister(user_id, &session).await;
            session.close();
            report.evicted += 1;
            tracing::warn!(
                %user_id,
                conn_id = %session.conn_id(),
                kind = %event.kind(),
                "evicted slow session: mailbox full during broadcast"
            );
        }

        report
    }
}
