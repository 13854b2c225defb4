//! In-memory [`Store`] implementation.
//!
//! Everything lives behind one `RwLock`. Data is lost on restart, which
//! is fine for development and tests; production deployments swap in a
//! database-backed store.

use std::collections::HashMap;

use chrono::Utc;
use parley_protocol::{FriendRequestId, GroupId, MessageId, UserId, UserStatus};
use tokio::sync::RwLock;

use crate::{
    Audience, FriendRequest, FriendRequestStatus, Group, GroupMember, GroupStatus, MemberRole,
    Message, NewMessage, Store, StoreError, User,
};

/// A stored account plus its salted password hash.
struct Account {
    user: User,
    salt: [u8; 16],
    password_hash: blake3::Hash,
}

impl Account {
    fn verify(&self, password: &str) -> bool {
        // blake3::Hash equality is constant-time.
        hash_password(&self.salt, password) == self.password_hash
    }
}

fn hash_password(salt: &[u8; 16], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<UserId, Account>,
    /// Lowercased username → id.
    usernames: HashMap<String, UserId>,
    /// Every message in save order.
    messages: Vec<Message>,
    groups: HashMap<GroupId, Group>,
    friend_requests: HashMap<FriendRequestId, FriendRequest>,
}

impl Inner {
    fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.accounts
            .get(&id)
            .map(|a| &a.user)
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    fn group(&self, id: GroupId) -> Result<&Group, StoreError> {
        self.groups.get(&id).ok_or(StoreError::GroupNotFound(id))
    }

    fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, StoreError> {
        self.groups.get_mut(&id).ok_or(StoreError::GroupNotFound(id))
    }

    /// The last `limit` global messages in `messages[..end]`, oldest first.
    fn global_page(&self, end: usize, limit: usize) -> Vec<Message> {
        let mut page: Vec<Message> = self.messages[..end]
            .iter()
            .rev()
            .filter(|m| m.audience == Audience::Global)
            .take(limit)
            .cloned()
            .collect();
        page.reverse();
        page
    }

    fn answer_friend_request(
        &mut self,
        id: FriendRequestId,
        status: FriendRequestStatus,
    ) -> Result<FriendRequest, StoreError> {
        let request = self
            .friend_requests
            .get_mut(&id)
            .ok_or(StoreError::FriendRequestNotFound(id))?;
        if request.status != FriendRequestStatus::Pending {
            return Err(StoreError::NotPending(id));
        }
        request.status = status;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }
}

/// A [`Store`] that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn authenticate_user(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::InvalidInput(
                "username and password are required".into(),
            ));
        }
        let key = username.to_lowercase();
        let mut inner = self.inner.write().await;

        if let Some(&id) = inner.usernames.get(&key) {
            let account = inner
                .accounts
                .get_mut(&id)
                .ok_or_else(|| StoreError::user_not_found(id))?;
            if !account.verify(password) {
                return Err(StoreError::InvalidCredentials);
            }
            account.user.last_seen = Utc::now();
            return Ok(account.user.clone());
        }

        let now = Utc::now();
        let salt: [u8; 16] = rand::random();
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            status: UserStatus::Offline,
            last_seen: now,
            created_at: now,
        };
        inner.usernames.insert(key, user.id);
        inner.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                salt,
                password_hash: hash_password(&salt, password),
            },
        );
        tracing::info!(user_id = %user.id, username = %user.username, "account created");
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.inner.read().await.user(id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let inner = self.inner.read().await;
        let id = inner
            .usernames
            .get(&username.trim().to_lowercase())
            .copied()
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))?;
        inner.user(id).cloned()
    }

    async fn update_user_status(&self, id: UserId, status: UserStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let account = inner
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::user_not_found(id))?;
        account.user.status = status;
        account.user.last_seen = Utc::now();
        Ok(())
    }

    async fn save_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut inner = self.inner.write().await;
        let sender_name = inner.user(message.sender_id)?.username.clone();
        let saved = Message {
            id: MessageId::new(),
            sender_id: message.sender_id,
            sender_name,
            audience: message.audience,
            content: message.content,
            sent_at: Utc::now(),
        };
        inner.messages.push(saved.clone());
        Ok(saved)
    }

    async fn get_messages(&self, limit: usize) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.global_page(inner.messages.len(), limit))
    }

    async fn get_messages_before_id(
        &self,
        before: MessageId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        match inner.messages.iter().position(|m| m.id == before) {
            Some(end) => Ok(inner.global_page(end, limit)),
            None => Ok(Vec::new()),
        }
    }

    async fn create_group(
        &self,
        name: &str,
        description: &str,
        created_by: UserId,
    ) -> Result<Group, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("group name is required".into()));
        }
        let mut inner = self.inner.write().await;
        inner.user(created_by)?;

        let now = Utc::now();
        let group = Group {
            id: GroupId::new(),
            name: name.to_string(),
            description: description.trim().to_string(),
            created_by,
            created_at: now,
            status: GroupStatus::Active,
            members: vec![GroupMember {
                user_id: created_by,
                role: MemberRole::Admin,
                joined_at: now,
            }],
        };
        inner.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, id: GroupId) -> Result<Group, StoreError> {
        self.inner.read().await.group(id).cloned()
    }

    async fn add_user_to_group(&self, group: GroupId, user: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.user(user)?;
        let group = inner.group_mut(group)?;
        if group.status != GroupStatus::Active {
            return Err(StoreError::InvalidInput(format!(
                "group {} is not active",
                group.id
            )));
        }
        if !group.is_member(user) {
            group.members.push(GroupMember {
                user_id: user,
                role: MemberRole::Member,
                joined_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn remove_user_from_group(&self, group: GroupId, user: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let group = inner.group_mut(group)?;
        if group.created_by == user {
            return Err(StoreError::CreatorCannotLeave(group.id));
        }
        let before = group.members.len();
        group.members.retain(|m| m.user_id != user);
        if group.members.len() == before {
            return Err(StoreError::NotMember {
                group: group.id,
                user,
            });
        }
        Ok(())
    }

    async fn is_group_member(&self, group: GroupId, user: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.group(group)?.is_member(user))
    }

    async fn get_group_members(&self, group: GroupId) -> Result<Vec<UserId>, StoreError> {
        Ok(self.inner.read().await.group(group)?.member_ids())
    }

    async fn get_user_groups(&self, user: UserId) -> Result<Vec<Group>, StoreError> {
        let inner = self.inner.read().await;
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| g.status != GroupStatus::Deleted && g.is_member(user))
            .cloned()
            .collect();
        groups.sort_by_key(|g| g.created_at);
        Ok(groups)
    }

    async fn create_friend_request(
        &self,
        from: UserId,
        to: UserId,
    ) -> Result<FriendRequest, StoreError> {
        if from == to {
            return Err(StoreError::InvalidInput(
                "cannot send a friend request to yourself".into(),
            ));
        }
        let mut inner = self.inner.write().await;
        inner.user(from)?;
        inner.user(to)?;

        let now = Utc::now();
        if let Some(existing) = inner
            .friend_requests
            .values_mut()
            .find(|r| r.connects(from, to))
        {
            if existing.status == FriendRequestStatus::Rejected {
                existing.from = from;
                existing.to = to;
                existing.status = FriendRequestStatus::Pending;
                existing.updated_at = now;
            }
            return Ok(existing.clone());
        }

        let request = FriendRequest {
            id: FriendRequestId::new(),
            from,
            to,
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.friend_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn accept_friend_request(&self, id: FriendRequestId) -> Result<FriendRequest, StoreError> {
        self.inner
            .write()
            .await
            .answer_friend_request(id, FriendRequestStatus::Accepted)
    }

    async fn reject_friend_request(&self, id: FriendRequestId) -> Result<FriendRequest, StoreError> {
        self.inner
            .write()
            .await
            .answer_friend_request(id, FriendRequestStatus::Rejected)
    }

    async fn get_friends(&self, user: UserId) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut friends = inner
            .friend_requests
            .values()
            .filter(|r| {
                r.status == FriendRequestStatus::Accepted && (r.from == user || r.to == user)
            })
            .map(|r| inner.user(r.other_party(user)).cloned())
            .collect::<Result<Vec<User>, StoreError>>()?;
        friends.sort_by_key(|u| u.username.to_lowercase());
        Ok(friends)
    }

    async fn get_pending_friend_requests(
        &self,
        user: UserId,
    ) -> Result<Vec<FriendRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut pending: Vec<FriendRequest> = inner
            .friend_requests
            .values()
            .filter(|r| r.status == FriendRequestStatus::Pending && r.to == user)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }

    async fn get_friend_request_users(
        &self,
        id: FriendRequestId,
    ) -> Result<(UserId, UserId), StoreError> {
        let inner = self.inner.read().await;
        let request = inner
            .friend_requests
            .get(&id)
            .ok_or(StoreError::FriendRequestNotFound(id))?;
        Ok((request.from, request.to))
    }
}
