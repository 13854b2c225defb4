//! State pushed right after a successful login.

use parley_protocol::{Event, FriendRequestNotice, MessageHistory, NoticeStatus};
use parley_session::Session;
use parley_store::Store;
use tracing::{debug, warn};

use crate::{NotificationKind, Router, RouterError};

impl<S: Store> Router<S> {
    /// Queues the login snapshot on a freshly registered session: recent
    /// history, the friend list, pending friend requests, then unread
    /// notifications.
    ///
    /// Each part is best-effort. A failure is logged and the rest still
    /// goes out.
    pub async fn welcome(&self, session: &Session) {
        let user_id = session.user_id();

        if let Err(e) = self.push_history(session).await {
            warn!(%user_id, error = %e, "failed to load history for login");
        }
        match self.friend_list(user_id).await {
            Ok(list) => {
                session.deliver(list);
            }
            Err(e) => warn!(%user_id, error = %e, "failed to load friends for login"),
        }
        match self.push_pending_requests(session).await {
            Ok(()) => {
                self.notifications
                    .mark_read(user_id, NotificationKind::FriendRequest)
                    .await;
            }
            Err(e) => warn!(%user_id, error = %e, "failed to load friend requests for login"),
        }

        let unread = self
            .notifications
            .take_unread(user_id, &[NotificationKind::FriendRequest])
            .await;
        debug!(%user_id, unread = unread.len(), "login snapshot queued");
        for notification in unread {
            session.deliver(notification.to_event());
        }
    }

    async fn push_history(&self, session: &Session) -> Result<(), RouterError> {
        let messages = self.store.get_messages(self.config.history_limit).await?;
        session.deliver(Event::MessageHistory(MessageHistory {
            messages: messages.iter().map(|m| m.to_chat()).collect(),
        }));
        Ok(())
    }

    async fn push_pending_requests(&self, session: &Session) -> Result<(), RouterError> {
        for request in self
            .store
            .get_pending_friend_requests(session.user_id())
            .await?
        {
            let from = self.store.get_user(request.from).await?;
            session.deliver(Event::FriendRequest(FriendRequestNotice {
                request_id: request.id,
                from_user: from.username,
                to_user: session.username().to_string(),
                status: NoticeStatus::Pending,
            }));
        }
        Ok(())
    }
}
