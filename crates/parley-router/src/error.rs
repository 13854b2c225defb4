//! Error types for the routing layer.
//!
//! Every variant here is a *domain* error: it is reported to the sender as
//! an `error` envelope and the connection stays open.

use parley_protocol::{ErrorCode, Event, ProtocolError, UserId};
use parley_session::SessionError;
use parley_store::StoreError;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Bad payload, unknown type, or empty content.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Well-formed but not allowed (befriending yourself, the creator
    /// leaving their group, answering an answered request).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Not a member of the group, or not the recipient of the request.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The sender has no registered session. The inbound pump can't run
    /// without one, so this is a bug, not a client mistake.
    #[error("no live session for user {0}")]
    NoSession(UserId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RouterError {
    /// The wire code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            RouterError::InvalidMessage(_) => ErrorCode::InvalidMessage,
            RouterError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            RouterError::NotAuthorized(_) => ErrorCode::NotAuthorized,
            RouterError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            RouterError::NoSession(_) => ErrorCode::Internal,
            RouterError::Store(e) => match e {
                StoreError::InvalidCredentials => ErrorCode::InvalidCredentials,
                StoreError::UserNotFound(_) => ErrorCode::UserNotFound,
                StoreError::GroupNotFound(_) => ErrorCode::GroupNotFound,
                StoreError::NotMember { .. } => ErrorCode::NotAuthorized,
                StoreError::FriendRequestNotFound(_)
                | StoreError::NotPending(_)
                | StoreError::CreatorCannotLeave(_)
                | StoreError::InvalidInput(_) => ErrorCode::InvalidRequest,
                StoreError::Backend(_) => ErrorCode::Internal,
            },
            RouterError::Protocol(e) if e.is_recoverable() => ErrorCode::InvalidMessage,
            RouterError::Protocol(_) | RouterError::Session(_) => ErrorCode::Internal,
        }
    }

    /// The `error` event sent back to the sender. Internal failures get a
    /// generic message.
    pub fn to_event(&self) -> Event {
        let code = self.code();
        let message = match code {
            ErrorCode::Internal => "internal server error".to_string(),
            _ => self.to_string(),
        };
        Event::error(code, message)
    }
}
