//! Group lifecycle: create, join, leave, list.

use std::collections::HashSet;

use parley_protocol::{CreateGroup, Event, GroupList, GroupMembership, GroupRef};
use parley_session::Session;
use parley_store::{Store, StoreError};
use serde_json::json;
use tracing::{info, warn};

use crate::{NotificationKind, Router, RouterError};

impl<S: Store> Router<S> {
    /// Creates a group with the sender as admin and adds the listed
    /// members. Unknown member ids are skipped.
    pub(crate) async fn group_create(
        &self,
        session: &Session,
        req: CreateGroup,
    ) -> Result<(), RouterError> {
        if req.name.trim().is_empty() {
            return Err(RouterError::InvalidRequest("group name is required".into()));
        }
        let creator = session.user_id();
        let group = self
            .store
            .create_group(&req.name, &req.description, creator)
            .await?;

        let mut seen = HashSet::from([creator]);
        let mut added = Vec::new();
        for member in req.member_ids {
            if !seen.insert(member) {
                continue;
            }
            match self.store.add_user_to_group(group.id, member).await {
                Ok(()) => added.push(member),
                Err(StoreError::UserNotFound(_)) => {
                    warn!(group_id = %group.id, user_id = %member, "skipping unknown group member");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let group = self.store.get_group(group.id).await?;
        info!(group_id = %group.id, name = %group.name, members = group.members.len(), "group created");

        self.deliver_to_all(group.member_ids(), Event::GroupCreate(group.to_info()))
            .await;
        for member in added {
            self.notifications
                .add(
                    member,
                    NotificationKind::GroupInvite,
                    format!("{} added you to {}", session.username(), group.name),
                    json!({ "group_id": group.id, "group_name": group.name }),
                )
                .await;
        }
        Ok(())
    }

    pub(crate) async fn group_join(
        &self,
        session: &Session,
        req: GroupRef,
    ) -> Result<(), RouterError> {
        let group = self.store.get_group(req.group_id).await?;
        self.store
            .add_user_to_group(group.id, session.user_id())
            .await?;
        let members = self.store.get_group_members(group.id).await?;

        self.deliver_to_all(
            members,
            Event::GroupJoin(GroupMembership {
                group_id: group.id,
                user_id: session.user_id(),
            }),
        )
        .await;
        Ok(())
    }

    /// Removes the sender. The creator can't leave their own group.
    pub(crate) async fn group_leave(
        &self,
        session: &Session,
        req: GroupRef,
    ) -> Result<(), RouterError> {
        let user = session.user_id();
        let group = self.store.get_group(req.group_id).await?;
        if !group.is_member(user) {
            return Err(RouterError::NotAuthorized(format!(
                "not a member of group {}",
                group.id
            )));
        }
        if group.created_by == user {
            return Err(RouterError::InvalidRequest(
                "the creator cannot leave the group".into(),
            ));
        }

        self.store.remove_user_from_group(group.id, user).await?;
        let remaining = self.store.get_group_members(group.id).await?;

        let event = Event::GroupLeave(GroupMembership {
            group_id: group.id,
            user_id: user,
        });
        self.deliver_to_all(remaining.into_iter().chain([user]), event)
            .await;
        Ok(())
    }

    pub(crate) async fn group_list(&self, session: &Session) -> Result<(), RouterError> {
        let groups = self.store.get_user_groups(session.user_id()).await?;
        session.deliver(Event::GroupList(GroupList {
            groups: groups.iter().map(|g| g.to_info()).collect(),
        }));
        Ok(())
    }
}
