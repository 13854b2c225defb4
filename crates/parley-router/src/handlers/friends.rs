//! Friend requests and responses.

use parley_protocol::{
    AddFriend, AnswerFriend, Event, FriendList, FriendRequestNotice, FriendResponseNotice,
    NoticeStatus, UserId,
};
use parley_session::Session;
use parley_store::{FriendRequestStatus, Store};
use serde_json::json;
use tracing::info;

use crate::{NotificationKind, Router, RouterError};

impl<S: Store> Router<S> {
    /// Opens (or re-opens) a request from the sender to `to_user`.
    ///
    /// The target hears about it with a `pending` notice, the sender gets
    /// a `sent` confirmation. Both carry the persisted request id.
    pub(crate) async fn friend_request(
        &self,
        session: &Session,
        req: AddFriend,
    ) -> Result<(), RouterError> {
        let name = req.to_user.trim();
        if name.is_empty() {
            return Err(RouterError::InvalidMessage("to_user is required".into()));
        }
        let target = self.store.get_user_by_username(name).await?;
        if target.id == session.user_id() {
            return Err(RouterError::InvalidRequest(
                "cannot send a friend request to yourself".into(),
            ));
        }

        let row = self
            .store
            .create_friend_request(session.user_id(), target.id)
            .await?;
        if row.status == FriendRequestStatus::Accepted {
            return Err(RouterError::AlreadyExists(format!(
                "already friends with {}",
                target.username
            )));
        }
        if row.from != session.user_id() {
            return Err(RouterError::AlreadyExists(format!(
                "{} already sent you a friend request",
                target.username
            )));
        }

        info!(request_id = %row.id, from = %session.user_id(), to = %target.id, "friend request");

        let notice = |status| {
            Event::FriendRequest(FriendRequestNotice {
                request_id: row.id,
                from_user: session.username().to_string(),
                to_user: target.username.clone(),
                status,
            })
        };
        self.deliver_to(target.id, notice(NoticeStatus::Pending)).await;
        self.notifications
            .add(
                target.id,
                NotificationKind::FriendRequest,
                format!("{} sent you a friend request", session.username()),
                json!({ "request_id": row.id, "from_user": session.username() }),
            )
            .await;
        session.deliver(notice(NoticeStatus::Sent));
        Ok(())
    }

    /// Accepts or rejects a request addressed to the sender.
    pub(crate) async fn friend_response(
        &self,
        session: &Session,
        req: AnswerFriend,
    ) -> Result<(), RouterError> {
        let (from, to) = self.store.get_friend_request_users(req.request_id).await?;
        if to != session.user_id() {
            return Err(RouterError::NotAuthorized(
                "not the recipient of this friend request".into(),
            ));
        }

        let row = if req.accept {
            self.store.accept_friend_request(req.request_id).await?
        } else {
            self.store.reject_friend_request(req.request_id).await?
        };
        let requester = self.store.get_user(from).await?;
        info!(request_id = %row.id, accept = req.accept, "friend request answered");

        // Each side is told the other side's name.
        self.deliver_to(
            requester.id,
            Event::FriendResponse(FriendResponseNotice {
                request_id: row.id,
                from_user: session.username().to_string(),
                accept: req.accept,
            }),
        )
        .await;
        session.deliver(Event::FriendResponse(FriendResponseNotice {
            request_id: row.id,
            from_user: requester.username.clone(),
            accept: req.accept,
        }));

        let verdict = if req.accept { "accepted" } else { "declined" };
        self.notifications
            .add(
                requester.id,
                NotificationKind::FriendResponse,
                format!("{} {verdict} your friend request", session.username()),
                json!({ "request_id": row.id, "accept": req.accept }),
            )
            .await;

        if req.accept {
            for user in [requester.id, session.user_id()] {
                let list = self.friend_list(user).await?;
                self.deliver_to(user, list).await;
            }
        }
        Ok(())
    }

    /// The user's current `friend_list` event.
    pub(crate) async fn friend_list(&self, user: UserId) -> Result<Event, RouterError> {
        let friends = self.store.get_friends(user).await?;
        Ok(Event::FriendList(FriendList {
            friends: friends.iter().map(|f| f.to_info()).collect(),
        }))
    }
}
