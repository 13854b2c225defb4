//! Domain records returned by the store.
//!
//! These are the store's view of the world. Each has a conversion to the
//! wire type clients see, so handlers never assemble payloads by hand.

use chrono::{DateTime, Utc};
use parley_protocol::{
    ChatMessage, FriendRequestId, GroupId, GroupInfo, MessageId, UserId, UserInfo, UserStatus,
};

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// As first given at signup; lookups ignore case.
    pub username: String,
    pub status: UserStatus,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            status: self.status,
        }
    }
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Everyone connected.
    Global,
    Direct(UserId),
    Group(GroupId),
}

/// A message about to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub audience: Audience,
    pub content: String,
}

impl NewMessage {
    pub fn global(sender_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            audience: Audience::Global,
            content: content.into(),
        }
    }

    pub fn direct(sender_id: UserId, recipient: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            audience: Audience::Direct(recipient),
            content: content.into(),
        }
    }

    pub fn group(sender_id: UserId, group: GroupId, content: impl Into<String>) -> Self {
        Self {
            sender_id,
            audience: Audience::Group(group),
            content: content.into(),
        }
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    /// Sender's username at the time the message was saved.
    pub sender_name: String,
    pub audience: Audience,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// The payload of a `global_message`/`direct_message`/`group_message`
    /// event or a `message_history` entry.
    pub fn to_chat(&self) -> ChatMessage {
        let (recipient_id, group_id) = match self.audience {
            Audience::Global => (None, None),
            Audience::Direct(user) => (Some(user), None),
            Audience::Group(group) => (None, Some(group)),
        };
        ChatMessage {
            id: self.id,
            content: self.content.clone(),
            sender_id: self.sender_id,
            sender_name: self.sender_name.clone(),
            sent_at: self.sent_at.timestamp(),
            recipient_id,
            group_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    Active,
    Archived,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: UserId,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A chat group. The creator is always an admin member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub status: GroupStatus,
    /// In join order.
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id).collect()
    }

    pub fn is_member(&self, user: UserId) -> bool {
        self.members.iter().any(|m| m.user_id == user)
    }

    pub fn to_info(&self) -> GroupInfo {
        GroupInfo {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_by: self.created_by,
            created_at: self.created_at.timestamp(),
            member_ids: self.member_ids(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A friend relationship between two users, keyed by its own id.
///
/// Rows are never deleted; answering a request only changes `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    pub id: FriendRequestId,
    pub from: UserId,
    pub to: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    /// Returns `true` if this row relates `a` and `b`, in either direction.
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    /// The party on the other side from `user`.
    pub fn other_party(&self, user: UserId) -> UserId {
        if self.from == user { self.to } else { self.from }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_to_chat_direct_sets_recipient_only() {
        let recipient = UserId::new();
        let message = Message {
            id: MessageId::new(),
            sender_id: UserId::new(),
            sender_name: "alice".into(),
            audience: Audience::Direct(recipient),
            content: "hey".into(),
            sent_at: Utc::now(),
        };

        let chat = message.to_chat();

        assert_eq!(chat.recipient_id, Some(recipient));
        assert_eq!(chat.group_id, None);
        assert_eq!(chat.sent_at, message.sent_at.timestamp());
    }

    #[test]
    fn test_friend_request_connects_either_direction() {
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let now = Utc::now();
        let request = FriendRequest {
            id: FriendRequestId::new(),
            from: a,
            to: b,
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        assert!(request.connects(a, b));
        assert!(request.connects(b, a));
        assert!(!request.connects(a, c));
        assert_eq!(request.other_party(a), b);
        assert_eq!(request.other_party(b), a);
    }
}
