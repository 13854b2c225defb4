//! Typed payloads, one sum type per direction.
//!
//! [`Request`] is everything a client may send; [`Event`] is everything
//! the server sends. Both convert to and from an [`Envelope`] by looking
//! at the type tag first and then decoding the payload into the struct
//! that tag calls for.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    Envelope, ErrorCode, FriendRequestId, GroupId, MessageId, MessageType, ProtocolError,
    UserId, UserStatus,
};

// ---------------------------------------------------------------------------
// Client → server payloads
// ---------------------------------------------------------------------------

/// `auth`: the only message accepted before the handshake completes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `load_messages`: page backwards through global history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadMessages {
    /// Only messages older than this one. Absent or `""` means "latest".
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub before_id: Option<MessageId>,
    /// `0` means "server default".
    #[serde(default)]
    pub limit: u32,
}

/// `global_message` from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostGlobal {
    pub content: String,
}

/// `direct_message` from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDirect {
    pub recipient_id: UserId,
    pub content: String,
}

/// `group_message` from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostGroup {
    pub group_id: GroupId,
    pub content: String,
}

/// `friend_request` from a client: ask the named user to be friends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFriend {
    #[serde(alias = "username")]
    pub to_user: String,
}

/// `friend_response` from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFriend {
    pub request_id: FriendRequestId,
    pub accept: bool,
}

/// `group_create` from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}

/// `group_join` / `group_leave` from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub group_id: GroupId,
}

/// A decoded client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Auth(Credentials),
    LoadMessages(LoadMessages),
    GlobalMessage(PostGlobal),
    DirectMessage(PostDirect),
    GroupMessage(PostGroup),
    FriendRequest(AddFriend),
    FriendResponse(AnswerFriend),
    GroupCreate(CreateGroup),
    GroupJoin(GroupRef),
    GroupLeave(GroupRef),
    GroupList,
    Ping,
    Pong,
}

impl Request {
    /// Returns the type tag this request travels under.
    pub fn kind(&self) -> MessageType {
        match self {
            Request::Auth(_) => MessageType::Auth,
            Request::LoadMessages(_) => MessageType::LoadMessages,
            Request::GlobalMessage(_) => MessageType::GlobalMessage,
            Request::DirectMessage(_) => MessageType::DirectMessage,
            Request::GroupMessage(_) => MessageType::GroupMessage,
            Request::FriendRequest(_) => MessageType::FriendRequest,
            Request::FriendResponse(_) => MessageType::FriendResponse,
            Request::GroupCreate(_) => MessageType::GroupCreate,
            Request::GroupJoin(_) => MessageType::GroupJoin,
            Request::GroupLeave(_) => MessageType::GroupLeave,
            Request::GroupList => MessageType::GroupList,
            Request::Ping => MessageType::Ping,
            Request::Pong => MessageType::Pong,
        }
    }

    /// Decodes the envelope's payload according to its type tag.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidPayload`] if the payload doesn't fit the tag
    /// - [`ProtocolError::Unsupported`] for server-only or unknown tags
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload, .. } = envelope;
        let request = match kind {
            MessageType::Auth => Request::Auth(typed(&kind, payload)?),
            MessageType::LoadMessages => Request::LoadMessages(typed(&kind, payload)?),
            MessageType::GlobalMessage => Request::GlobalMessage(typed(&kind, payload)?),
            MessageType::DirectMessage => Request::DirectMessage(typed(&kind, payload)?),
            MessageType::GroupMessage => Request::GroupMessage(typed(&kind, payload)?),
            MessageType::FriendRequest => Request::FriendRequest(typed(&kind, payload)?),
            MessageType::FriendResponse => Request::FriendResponse(typed(&kind, payload)?),
            MessageType::GroupCreate => Request::GroupCreate(typed(&kind, payload)?),
            MessageType::GroupJoin => Request::GroupJoin(typed(&kind, payload)?),
            MessageType::GroupLeave => Request::GroupLeave(typed(&kind, payload)?),
            MessageType::GroupList => Request::GroupList,
            MessageType::Ping => Request::Ping,
            MessageType::Pong => Request::Pong,
            other => return Err(ProtocolError::Unsupported(other)),
        };
        Ok(request)
    }

    /// Wraps this request in a freshly stamped envelope.
    pub fn to_envelope(&self) -> Result<Envelope, ProtocolError> {
        let payload = match self {
            Request::Auth(p) => to_value(p)?,
            Request::LoadMessages(p) => to_value(p)?,
            Request::GlobalMessage(p) => to_value(p)?,
            Request::DirectMessage(p) => to_value(p)?,
            Request::GroupMessage(p) => to_value(p)?,
            Request::FriendRequest(p) => to_value(p)?,
            Request::FriendResponse(p) => to_value(p)?,
            Request::GroupCreate(p) => to_value(p)?,
            Request::GroupJoin(p) | Request::GroupLeave(p) => to_value(p)?,
            Request::GroupList | Request::Ping | Request::Pong => Value::Null,
        };
        Ok(Envelope::new(self.kind(), payload))
    }
}

// ---------------------------------------------------------------------------
// Server → client payloads
// ---------------------------------------------------------------------------

/// `auth_response`: the result of the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    pub fn accepted(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            success: true,
            user_id: Some(user_id),
            username: Some(username.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            user_id: None,
            username: None,
            error: Some(error.into()),
        }
    }
}

/// A chat message as delivered to clients, live or from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub content: String,
    pub sender_id: UserId,
    pub sender_name: String,
    /// Unix seconds.
    pub sent_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

/// `message_history`: oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MessageHistory {
    pub messages: Vec<ChatMessage>,
}

/// `status_update`: someone's presence changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub user_id: UserId,
    pub status: UserStatus,
}

/// Which side of a friend request a [`FriendRequestNotice`] is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeStatus {
    /// Sent to the target: someone wants to be friends.
    Pending,
    /// Sent to the requester: the request went out.
    Sent,
}

/// `friend_request` from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestNotice {
    pub request_id: FriendRequestId,
    /// Requester's username.
    pub from_user: String,
    /// Target's username.
    pub to_user: String,
    pub status: NoticeStatus,
}

/// `friend_response` from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendResponseNotice {
    pub request_id: FriendRequestId,
    /// The other party's username.
    pub from_user: String,
    pub accept: bool,
}

/// One entry in a friend list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub status: UserStatus,
}

/// `friend_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FriendList {
    pub friends: Vec<UserInfo>,
}

/// A group as described to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub created_by: UserId,
    /// Unix seconds.
    pub created_at: i64,
    pub member_ids: Vec<UserId>,
}

/// `group_join` / `group_leave` from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub user_id: UserId,
}

/// `group_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GroupList {
    pub groups: Vec<GroupInfo>,
}

/// `notification`: an out-of-band alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: u16,
    pub message: String,
}

/// A message the server sends to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AuthResponse(AuthResponse),
    MessageHistory(MessageHistory),
    GlobalMessage(ChatMessage),
    DirectMessage(ChatMessage),
    GroupMessage(ChatMessage),
    StatusUpdate(StatusUpdate),
    FriendRequest(FriendRequestNotice),
    FriendResponse(FriendResponseNotice),
    FriendList(FriendList),
    GroupCreate(GroupInfo),
    GroupJoin(GroupMembership),
    GroupLeave(GroupMembership),
    GroupList(GroupList),
    Notification(NotificationPayload),
    Ping,
    Pong,
    Error(ErrorPayload),
}

impl Event {
    /// Builds an `error` event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Event::Error(ErrorPayload {
            code: code.code(),
            message: message.into(),
        })
    }

    /// Returns the type tag this event travels under.
    pub fn kind(&self) -> MessageType {
        match self {
            Event::AuthResponse(_) => MessageType::AuthResponse,
            Event::MessageHistory(_) => MessageType::MessageHistory,
            Event::GlobalMessage(_) => MessageType::GlobalMessage,
            Event::DirectMessage(_) => MessageType::DirectMessage,
            Event::GroupMessage(_) => MessageType::GroupMessage,
            Event::StatusUpdate(_) => MessageType::StatusUpdate,
            Event::FriendRequest(_) => MessageType::FriendRequest,
            Event::FriendResponse(_) => MessageType::FriendResponse,
            Event::FriendList(_) => MessageType::FriendList,
            Event::GroupCreate(_) => MessageType::GroupCreate,
            Event::GroupJoin(_) => MessageType::GroupJoin,
            Event::GroupLeave(_) => MessageType::GroupLeave,
            Event::GroupList(_) => MessageType::GroupList,
            Event::Notification(_) => MessageType::Notification,
            Event::Ping => MessageType::Ping,
            Event::Pong => MessageType::Pong,
            Event::Error(_) => MessageType::Error,
        }
    }

    /// Wraps this event in a freshly stamped envelope.
    pub fn to_envelope(&self) -> Result<Envelope, ProtocolError> {
        let payload = match self {
            Event::AuthResponse(p) => to_value(p)?,
            Event::MessageHistory(p) => to_value(p)?,
            Event::GlobalMessage(p) | Event::DirectMessage(p) | Event::GroupMessage(p) => {
                to_value(p)?
            }
            Event::StatusUpdate(p) => to_value(p)?,
            Event::FriendRequest(p) => to_value(p)?,
            Event::FriendResponse(p) => to_value(p)?,
            Event::FriendList(p) => to_value(p)?,
            Event::GroupCreate(p) => to_value(p)?,
            Event::GroupJoin(p) | Event::GroupLeave(p) => to_value(p)?,
            Event::GroupList(p) => to_value(p)?,
            Event::Notification(p) => to_value(p)?,
            Event::Error(p) => to_value(p)?,
            Event::Ping | Event::Pong => Value::Null,
        };
        Ok(Envelope::new(self.kind(), payload))
    }

    /// Decodes a server envelope. Used by clients and tests.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { kind, payload, .. } = envelope;
        let event = match kind {
            MessageType::AuthResponse => Event::AuthResponse(typed(&kind, payload)?),
            MessageType::MessageHistory => Event::MessageHistory(typed(&kind, payload)?),
            MessageType::GlobalMessage => Event::GlobalMessage(typed(&kind, payload)?),
            MessageType::DirectMessage => Event::DirectMessage(typed(&kind, payload)?),
            MessageType::GroupMessage => Event::GroupMessage(typed(&kind, payload)?),
            MessageType::StatusUpdate => Event::StatusUpdate(typed(&kind, payload)?),
            MessageType::FriendRequest => Event::FriendRequest(typed(&kind, payload)?),
            MessageType::FriendResponse => Event::FriendResponse(typed(&kind, payload)?),
            MessageType::FriendList => Event::FriendList(typed(&kind, payload)?),
            MessageType::GroupCreate => Event::GroupCreate(typed(&kind, payload)?),
            MessageType::GroupJoin => Event::GroupJoin(typed(&kind, payload)?),
            MessageType::GroupLeave => Event::GroupLeave(typed(&kind, payload)?),
            MessageType::GroupList => Event::GroupList(typed(&kind, payload)?),
            MessageType::Notification => Event::Notification(typed(&kind, payload)?),
            MessageType::Error => Event::Error(typed(&kind, payload)?),
            MessageType::Ping => Event::Ping,
            MessageType::Pong => Event::Pong,
            other => return Err(ProtocolError::Unsupported(other)),
        };
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn typed<T: DeserializeOwned>(kind: &MessageType, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        kind: kind.clone(),
        source,
    })
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(payload).map_err(ProtocolError::Encode)
}

/// Older clients send `"before_id": ""` to mean "no cursor".
fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(kind: &str, payload: Value) -> Envelope {
        Envelope {
            kind: MessageType::parse(kind),
            payload,
            timestamp: 0,
        }
    }

    #[test]
    fn test_request_auth_decodes() {
        let request = Request::from_envelope(envelope(
            "auth",
            json!({ "username": "alice", "password": "pw" }),
        ))
        .unwrap();
        assert_eq!(
            request,
            Request::Auth(Credentials {
                username: "alice".into(),
                password: "pw".into()
            })
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_request_load_messages_empty_before_id_is_none() {
        let request = Request::from_envelope(envelope(
            "load_messages",
            json!({ "before_id": "", "limit": 20 }),
        ))
        .unwrap();
        assert_eq!(
            request,
            Request::LoadMessages(LoadMessages {
                before_id: None,
                limit: 20
            })
        );
    }

    #[test]
    fn test_request_load_messages_defaults_when_fields_missing() {
        let request = Request::from_envelope(envelope("load_messages", json!({}))).unwrap();
        assert_eq!(
            request,
            Request::LoadMessages(LoadMessages {
                before_id: None,
                limit: 0
            })
        );
    }

    #[test]
    fn test_request_direct_message_empty_recipient_is_invalid_payload() {
        let result = Request::from_envelope(envelope(
            "direct_message",
            json!({ "recipient_id": "", "content": "hi" }),
        ));
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload {
                kind: MessageType::DirectMessage,
                ..
            })
        ));
        assert!(result.unwrap_err().is_recoverable());
    }

    #[test]
    fn test_request_ping_ignores_payload() {
        let request = Request::from_envelope(envelope("ping", json!({}))).unwrap();
        assert_eq!(request, Request::Ping);
    }

    #[test]
    fn test_request_friend_request_accepts_username_alias() {
        let request =
            Request::from_envelope(envelope("friend_request", json!({ "username": "bob" })))
                .unwrap();
        assert_eq!(
            request,
            Request::FriendRequest(AddFriend {
                to_user: "bob".into()
            })
        );
    }

    #[test]
    fn test_request_server_only_type_is_unsupported() {
        let result = Request::from_envelope(envelope("status_update", json!({})));
        assert!(matches!(
            result,
            Err(ProtocolError::Unsupported(MessageType::StatusUpdate))
        ));
    }

    #[test]
    fn test_request_unknown_type_is_unsupported() {
        let result = Request::from_envelope(envelope("typing", Value::Null));
        assert!(matches!(result, Err(ProtocolError::Unsupported(MessageType::Unknown(_)))));
    }

    #[test]
    fn test_request_group_create_optional_fields_default() {
        let request =
            Request::from_envelope(envelope("group_create", json!({ "name": "rust" }))).unwrap();
        let Request::GroupCreate(create) = request else {
            panic!("expected GroupCreate");
        };
        assert_eq!(create.name, "rust");
        assert!(create.description.is_empty());
        assert!(create.member_ids.is_empty());
    }

    #[test]
    fn test_request_to_envelope_then_decode() {
        let request = Request::GlobalMessage(PostGlobal {
            content: "hello".into(),
        });
        let decoded = Request::from_envelope(request.to_envelope().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_event_chat_message_json_format() {
        let sender = UserId::new();
        let id = MessageId::new();
        let event = Event::GlobalMessage(ChatMessage {
            id,
            content: "hi".into(),
            sender_id: sender,
            sender_name: "alice".into(),
            sent_at: 1_700_000_000,
            recipient_id: None,
            group_id: None,
        });

        let envelope = event.to_envelope().unwrap();

        assert_eq!(envelope.kind, MessageType::GlobalMessage);
        assert_eq!(
            envelope.payload,
            json!({
                "id": id.to_string(),
                "content": "hi",
                "sender_id": sender.to_string(),
                "sender_name": "alice",
                "sent_at": 1_700_000_000
            })
        );
    }

    #[test]
    fn test_event_error_json_format() {
        let envelope = Event::error(ErrorCode::NotAuthorized, "not a member")
            .to_envelope()
            .unwrap();
        assert_eq!(envelope.kind, MessageType::Error);
        assert_eq!(
            envelope.payload,
            json!({ "code": 1006, "message": "not a member" })
        );
    }

    #[test]
    fn test_event_auth_response_rejected_omits_identity() {
        let envelope = Event::AuthResponse(AuthResponse::rejected("bad password"))
            .to_envelope()
            .unwrap();
        assert_eq!(
            envelope.payload,
            json!({ "success": false, "error": "bad password" })
        );
    }

    #[test]
    fn test_event_status_update_decodes() {
        let user = UserId::new();
        let event = Event::from_envelope(envelope(
            "status_update",
            json!({ "user_id": user.to_string(), "status": "away" }),
        ))
        .unwrap();
        assert_eq!(
            event,
            Event::StatusUpdate(StatusUpdate {
                user_id: user,
                status: UserStatus::Away
            })
        );
    }

    #[test]
    fn test_event_notification_uses_type_field() {
        let envelope = Event::Notification(NotificationPayload {
            kind: "group_invite".into(),
            message: "you were added to rust".into(),
            data: Value::Null,
        })
        .to_envelope()
        .unwrap();
        assert_eq!(
            envelope.payload,
            json!({ "type": "group_invite", "message": "you were added to rust" })
        );
    }
}
