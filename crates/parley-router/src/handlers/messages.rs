//! History, global, direct, and group chat.

use std::sync::Arc;

use parley_protocol::{Event, LoadMessages, MessageHistory, PostDirect, PostGlobal, PostGroup};
use parley_session::Session;
use parley_store::{NewMessage, Store};
use serde_json::json;
use tracing::debug;

use super::require_content;
use crate::{NotificationKind, Router, RouterError};

impl<S: Store> Router<S> {
    pub(crate) async fn load_messages(
        &self,
        session: &Session,
        req: LoadMessages,
    ) -> Result<(), RouterError> {
        let limit = self.config.page_size(req.limit);
        let messages = match req.before_id {
            Some(before) => self.store.get_messages_before_id(before, limit).await?,
            None => self.store.get_messages(limit).await?,
        };
        session.deliver(Event::MessageHistory(MessageHistory {
            messages: messages.iter().map(|m| m.to_chat()).collect(),
        }));
        Ok(())
    }

    /// Persist, then hand to the broadcast queue. The sender gets their
    /// copy from the fan-out like everyone else.
    pub(crate) async fn global_message(
        &self,
        session: &Session,
        req: PostGlobal,
    ) -> Result<(), RouterError> {
        require_content(&req.content)?;
        let saved = self
            .store
            .save_message(NewMessage::global(session.user_id(), req.content))
            .await?;
        self.publish(Event::GlobalMessage(saved.to_chat())).await
    }

    /// Persist, deliver to the recipient if online, echo to the sender.
    ///
    /// An offline recipient gets a `new_message` notification instead and
    /// can read the message later.
    pub(crate) async fn direct_message(
        &self,
        session: &Session,
        req: PostDirect,
    ) -> Result<(), RouterError> {
        require_content(&req.content)?;
        let recipient = self.store.get_user(req.recipient_id).await?;
        let saved = self
            .store
            .save_message(NewMessage::direct(
                session.user_id(),
                recipient.id,
                req.content,
            ))
            .await?;

        let event = Arc::new(Event::DirectMessage(saved.to_chat()));
        if recipient.id != session.user_id()
            && !self.deliver_to(recipient.id, Arc::clone(&event)).await
        {
            debug!(recipient = %recipient.id, "direct message recipient offline");
            self.notifications
                .add(
                    recipient.id,
                    NotificationKind::NewMessage,
                    format!("New message from {}", session.username()),
                    json!({
                        "message_id": saved.id,
                        "sender_id": saved.sender_id,
                        "sender_name": saved.sender_name,
                    }),
                )
                .await;
        }
        session.deliver(event);
        Ok(())
    }

    /// Members only. Persist, then deliver to every online member,
    /// sender included.
    pub(crate) async fn group_message(
        &self,
        session: &Session,
        req: PostGroup,
    ) -> Result<(), RouterError> {
        require_content(&req.content)?;
        if !self
            .store
            .is_group_member(req.group_id, session.user_id())
            .await?
        {
            return Err(RouterError::NotAuthorized(format!(
                "not a member of group {}",
                req.group_id
            )));
        }

        let saved = self
            .store
            .save_message(NewMessage::group(
                session.user_id(),
                req.group_id,
                req.content,
            ))
            .await?;
        let members = self.store.get_group_members(req.group_id).await?;
        let delivered = self
            .deliver_to_all(members, Event::GroupMessage(saved.to_chat()))
            .await;
        debug!(group_id = %req.group_id, delivered, "group message delivered");
        Ok(())
    }
}
