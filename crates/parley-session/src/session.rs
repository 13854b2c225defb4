//! A live, authenticated connection and its outbound mailbox.
//!
//! A [`Session`] is shared (`Arc<Session>`) between the registry, the
//! broadcaster, handlers, and the connection's own pumps. Anyone holding
//! it can enqueue events or close it; only the connection's outbound pump
//! holds the receiving [`Mailbox`].
//!
//! ```text
//!   handlers ─┐
//!   broadcast ┼─ try_send ──→ [ bounded mailbox ] ──→ outbound pump ──→ socket
//!   self      ┘
//! ```
//!
//! Closing is one-shot: the first `close()` marks the mailbox closed and
//! cancels the session's token, which stops both pumps. Every later send
//! fails with [`SessionError::MailboxClosed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parley_protocol::{Event, UserId};
use parley_transport::ConnectionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::SessionError;

/// One authenticated user's live connection.
#[derive(Debug)]
pub struct Session {
    conn_id: ConnectionId,
    user_id: UserId,
    username: String,
    tx: mpsc::Sender<Arc<Event>>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl Session {
    /// Creates a session and the receiving end of its mailbox.
    ///
    /// The session's cancellation token is a child of `shutdown`, so a
    /// server-wide shutdown stops it too.
    pub fn new(
        conn_id: ConnectionId,
        user_id: UserId,
        username: impl Into<String>,
        capacity: usize,
        shutdown: &CancellationToken,
    ) -> (Arc<Self>, Mailbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let session = Arc::new(Self {
            conn_id,
            user_id,
            username: username.into(),
            tx,
            closed: AtomicBool::new(false),
            cancel: shutdown.child_token(),
        });
        (session, Mailbox { rx })
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Enqueues an event without waiting.
    ///
    /// # Errors
    /// - [`SessionError::MailboxFull`]: at capacity right now
    /// - [`SessionError::MailboxClosed`]: the session is gone
    pub fn try_send(&self, event: impl Into<Arc<Event>>) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::MailboxClosed(self.user_id));
        }
        self.tx.try_send(event.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::MailboxFull(self.user_id),
            mpsc::error::TrySendError::Closed(_) => SessionError::MailboxClosed(self.user_id),
        })
    }

    /// Best-effort delivery: enqueues the event, or logs and drops it.
    ///
    /// Returns `true` if the event was queued.
    pub fn deliver(&self, event: impl Into<Arc<Event>>) -> bool {
        match self.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(
                    user_id = %self.user_id,
                    conn_id = %self.conn_id,
                    error = %e,
                    "dropped event for session"
                );
                false
            }
        }
    }

    /// Closes the session. Returns `true` only for the call that actually
    /// closed it; later calls are no-ops.
    pub fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel.cancel();
        tracing::debug!(user_id = %self.user_id, conn_id = %self.conn_id, "session closed");
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }

    /// A token that is cancelled when this session closes or the server
    /// shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// The receiving end of a session's mailbox, owned by its outbound pump.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::Receiver<Arc<Event>>,
}

impl Mailbox {
    /// Waits for the next queued event, in enqueue order.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.rx.recv().await
    }

    /// Takes the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.rx.try_recv().ok()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize) -> (Arc<Session>, Mailbox) {
        Session::new(
            ConnectionId::new(1),
            UserId::new(),
            "alice",
            capacity,
            &CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_try_send_preserves_fifo_order() {
        let (session, mut mailbox) = session(8);

        session.try_send(Event::Ping).unwrap();
        session.try_send(Event::Pong).unwrap();

        assert_eq!(*mailbox.recv().await.unwrap(), Event::Ping);
        assert_eq!(*mailbox.recv().await.unwrap(), Event::Pong);
    }

    #[test]
    fn test_try_send_full_mailbox_is_full_error() {
        let (session, _mailbox) = session(1);
        session.try_send(Event::Ping).unwrap();

        let result = session.try_send(Event::Ping);

        assert!(matches!(result, Err(SessionError::MailboxFull(_))));
        assert!(!session.deliver(Event::Ping));
    }

    #[test]
    fn test_close_is_one_shot() {
        let (session, _mailbox) = session(4);

        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());
        assert!(session.cancel_token().is_cancelled());
    }

    #[test]
    fn test_try_send_after_close_is_closed_error() {
        let (session, _mailbox) = session(4);
        session.close();

        let result = session.try_send(Event::Ping);

        assert!(matches!(result, Err(SessionError::MailboxClosed(_))));
    }

    #[test]
    fn test_try_send_after_mailbox_dropped_is_closed_error() {
        let (session, mailbox) = session(4);
        drop(mailbox);

        let result = session.try_send(Event::Ping);

        assert!(matches!(result, Err(SessionError::MailboxClosed(_))));
    }

    #[test]
    fn test_server_shutdown_closes_session_token() {
        let shutdown = CancellationToken::new();
        let (session, _mailbox) =
            Session::new(ConnectionId::new(1), UserId::new(), "alice", 4, &shutdown);

        shutdown.cancel();

        assert!(session.is_closed());
    }
}
