//! Error types for the store layer.

use parley_protocol::{FriendRequestId, GroupId, UserId};

/// Errors a [`Store`](crate::Store) call can return.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Username exists but the password does not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No user with this id or username.
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("friend request not found: {0}")]
    FriendRequestNotFound(FriendRequestId),

    /// Accept/reject on a request that was already answered.
    #[error("friend request {0} is not pending")]
    NotPending(FriendRequestId),

    #[error("user {user} is not a member of group {group}")]
    NotMember { group: GroupId, user: UserId },

    /// The creator of a group can never be removed from it.
    #[error("the creator cannot leave group {0}")]
    CreatorCannotLeave(GroupId),

    /// Arguments the store refuses outright (empty names, self-requests).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing storage failed.
    #[error("storage backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn user_not_found(id: UserId) -> Self {
        StoreError::UserNotFound(id.to_string())
    }
}
