//! Dispatch from a decoded request to exactly one domain handler.

use std::sync::Arc;

use parley_protocol::{Envelope, Event, Request, UserId};
use parley_presence::Presence;
use parley_session::{Broadcaster, Registry, Session};
use parley_store::Store;
use tracing::{debug, error, warn};

use crate::{NotificationCenter, RouterConfig, RouterError};

/// Everything a handler needs, shared by every connection.
///
/// The handlers themselves live in `handlers/` as further `impl` blocks on
/// this type, one file per domain.
pub struct Router<S: Store> {
    pub(crate) store: Arc<S>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) broadcaster: Broadcaster,
    pub(crate) presence: Arc<Presence<S>>,
    pub(crate) notifications: Arc<NotificationCenter>,
    pub(crate) config: RouterConfig,
}

impl<S: Store> Router<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<Registry>,
        broadcaster: Broadcaster,
        presence: Arc<Presence<S>>,
        notifications: Arc<NotificationCenter>,
        config: RouterConfig,
    ) -> Self {
        Self {
            store,
            registry,
            broadcaster,
            presence,
            notifications,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn presence(&self) -> &Arc<Presence<S>> {
        &self.presence
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Decodes and routes one inbound envelope from `session`'s user.
    ///
    /// Never fails: a domain error becomes an `error` event on the
    /// sender's own mailbox and the connection carries on.
    pub async fn dispatch(&self, session: &Session, envelope: Envelope) {
        let user_id = session.user_id();
        let kind = envelope.kind.clone();

        let result = match Request::from_envelope(envelope) {
            Ok(request) => self.route(user_id, request).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            match &e {
                RouterError::NoSession(_) | RouterError::Session(_) => {
                    error!(%user_id, %kind, error = %e, "request failed");
                }
                _ => debug!(%user_id, %kind, error = %e, "request rejected"),
            }
            session.deliver(e.to_event());
        }
    }

    /// Runs the handler for `request` on behalf of `sender`.
    ///
    /// # Errors
    /// - [`RouterError::NoSession`] if `sender` isn't registered
    /// - whatever the handler reports, for the caller to send back
    pub async fn route(&self, sender: UserId, request: Request) -> Result<(), RouterError> {
        let session = self
            .registry
            .lookup(sender)
            .await
            .ok_or(RouterError::NoSession(sender))?;

        // Keepalives aren't activity: they never reset the idle clock.
        match request {
            Request::Ping => {
                session.deliver(Event::Pong);
                return Ok(());
            }
            Request::Pong => return Ok(()),
            _ => {}
        }

        self.presence.activity(sender).await;

        match request {
            Request::LoadMessages(req) => self.load_messages(&session, req).await,
            Request::GlobalMessage(req) => self.global_message(&session, req).await,
            Request::DirectMessage(req) => self.direct_message(&session, req).await,
            Request::GroupMessage(req) => self.group_message(&session, req).await,
            Request::FriendRequest(req) => self.friend_request(&session, req).await,
            Request::FriendResponse(req) => self.friend_response(&session, req).await,
            Request::GroupCreate(req) => self.group_create(&session, req).await,
            Request::GroupJoin(req) => self.group_join(&session, req).await,
            Request::GroupLeave(req) => self.group_leave(&session, req).await,
            Request::GroupList => self.group_list(&session).await,
            Request::Ping | Request::Pong => Ok(()),
            Request::Auth(_) => Err(RouterError::InvalidRequest(
                "already authenticated".into(),
            )),
        }
    }

    /// Queues `event` for `user` if they're online. Offline users are
    /// skipped.
    pub(crate) async fn deliver_to(&self, user: UserId, event: impl Into<Arc<Event>>) -> bool {
        match self.registry.lookup(user).await {
            Some(session) => session.deliver(event),
            None => false,
        }
    }

    /// Queues one shared copy of `event` for every online user in `users`.
    pub(crate) async fn deliver_to_all(
        &self,
        users: impl IntoIterator<Item = UserId>,
        event: Event,
    ) -> usize {
        let event = Arc::new(event);
        let mut delivered = 0;
        for user in users {
            if self.deliver_to(user, Arc::clone(&event)).await {
                delivered += 1;
            }
        }
        delivered
    }

    pub(crate) async fn publish(&self, event: Event) -> Result<(), RouterError> {
        self.broadcaster.publish(event).await.map_err(|e| {
            warn!(error = %e, "broadcast queue closed");
            RouterError::Session(e)
        })
    }
}
