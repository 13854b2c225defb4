//! Core protocol types: identifiers, the message type tag, and the
//! envelope every frame is wrapped in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Declares a uuid-backed newtype identifier.
///
/// Each id serializes as the bare uuid string (`#[serde(transparent)]`),
/// so `UserId` and `GroupId` look the same on the wire but can't be mixed
/// up in Rust.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing uuid.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying uuid.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Identifies a user account.
    UserId
}

uuid_id! {
    /// Identifies a group.
    GroupId
}

uuid_id! {
    /// Identifies a persisted chat message.
    MessageId
}

uuid_id! {
    /// Identifies a persisted friend request.
    FriendRequestId
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// A user's presence as seen by everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Online,
    Away,
    #[default]
    Offline,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Away => "away",
            UserStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MessageType: the envelope's type tag
// ---------------------------------------------------------------------------

/// The `type` tag carried by every envelope.
///
/// Tags this server doesn't know are kept as [`MessageType::Unknown`]
/// instead of failing the whole envelope, so a client speaking a newer
/// dialect gets an error reply rather than a dropped connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Auth,
    AuthResponse,
    MessageHistory,
    LoadMessages,
    LoadMessagesResponse,
    GlobalMessage,
    DirectMessage,
    GroupMessage,
    StatusUpdate,
    FriendRequest,
    FriendResponse,
    FriendList,
    FriendRemove,
    GroupCreate,
    GroupJoin,
    GroupLeave,
    GroupList,
    GroupInvite,
    Notification,
    Ping,
    Pong,
    Error,
    /// Any tag not listed above, preserved verbatim.
    Unknown(String),
}

impl MessageType {
    /// Returns the wire spelling of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Auth => "auth",
            MessageType::AuthResponse => "auth_response",
            MessageType::MessageHistory => "message_history",
            MessageType::LoadMessages => "load_messages",
            MessageType::LoadMessagesResponse => "load_messages_response",
            MessageType::GlobalMessage => "global_message",
            MessageType::DirectMessage => "direct_message",
            MessageType::GroupMessage => "group_message",
            MessageType::StatusUpdate => "status_update",
            MessageType::FriendRequest => "friend_request",
            MessageType::FriendResponse => "friend_response",
            MessageType::FriendList => "friend_list",
            MessageType::FriendRemove => "friend_remove",
            MessageType::GroupCreate => "group_create",
            MessageType::GroupJoin => "group_join",
            MessageType::GroupLeave => "group_leave",
            MessageType::GroupList => "group_list",
            MessageType::GroupInvite => "group_invite",
            MessageType::Notification => "notification",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
            MessageType::Error => "error",
            MessageType::Unknown(tag) => tag,
        }
    }

    /// Parses a wire tag. Never fails: unrecognised tags become
    /// [`MessageType::Unknown`].
    pub fn parse(tag: &str) -> Self {
        match tag {
            "auth" => MessageType::Auth,
            "auth_response" => MessageType::AuthResponse,
            "message_history" => MessageType::MessageHistory,
            "load_messages" => MessageType::LoadMessages,
            "load_messages_response" => MessageType::LoadMessagesResponse,
            "global_message" => MessageType::GlobalMessage,
            "direct_message" => MessageType::DirectMessage,
            "group_message" => MessageType::GroupMessage,
            "status_update" => MessageType::StatusUpdate,
            "friend_request" => MessageType::FriendRequest,
            "friend_response" => MessageType::FriendResponse,
            "friend_list" => MessageType::FriendList,
            "friend_remove" => MessageType::FriendRemove,
            "group_create" => MessageType::GroupCreate,
            "group_join" => MessageType::GroupJoin,
            "group_leave" => MessageType::GroupLeave,
            "group_list" => MessageType::GroupList,
            "group_invite" => MessageType::GroupInvite,
            "notification" => MessageType::Notification,
            "ping" => MessageType::Ping,
            "pong" => MessageType::Pong,
            "error" => MessageType::Error,
            other => MessageType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(MessageType::parse(&tag))
    }
}

// ---------------------------------------------------------------------------
// Envelope: the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every frame on the wire is one Envelope.
///
/// ```text
/// {"type":"global_message","payload":{"content":"hi"},"timestamp":1718000000}
/// ```
///
/// The payload is kept as raw JSON here; its shape depends on `kind`, and
/// turning it into a typed value is a second step (see
/// [`Request::from_envelope`](crate::Request::from_envelope)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// What kind of message this is.
    #[serde(rename = "type")]
    pub kind: MessageType,

    /// Type-specific content. Missing payloads decode as `null`.
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Unix seconds at construction time. Clients may omit it.
    #[serde(default)]
    pub timestamp: i64,
}

impl Envelope {
    /// Creates an envelope stamped with the current time.
    pub fn new(kind: MessageType, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
