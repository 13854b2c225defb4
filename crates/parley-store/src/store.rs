//! The persistence contract.
//!
//! Parley doesn't care how users, messages, groups and friendships are
//! stored; it only calls the [`Store`] trait. [`MemoryStore`](crate::MemoryStore)
//! is the reference implementation. A database-backed store implements the
//! same trait and plugs in without touching the router.
//!
//! Every method may be called concurrently from many connection tasks,
//! so implementations handle their own locking.

use std::future::Future;

use parley_protocol::{FriendRequestId, GroupId, MessageId, UserId, UserStatus};

use crate::{FriendRequest, Group, Message, NewMessage, StoreError, User};

/// Persistent storage for Parley's domain data.
///
/// Methods return `impl Future + Send` rather than being `async fn` so the
/// futures can be awaited inside spawned tasks.
pub trait Store: Send + Sync + 'static {
    // -- Users --

    /// Verifies a username/password pair.
    ///
    /// An unseen username creates a new account with that password
    /// (signup on first login).
    ///
    /// # Errors
    /// - [`StoreError::InvalidCredentials`]: wrong password
    /// - [`StoreError::InvalidInput`]: empty username or password
    fn authenticate_user(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn get_user(&self, id: UserId) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Looks a user up by name, ignoring case.
    fn get_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Records a presence change and bumps `last_seen`.
    fn update_user_status(
        &self,
        id: UserId,
        status: UserStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    // -- Messages --

    fn save_message(
        &self,
        message: NewMessage,
    ) -> impl Future<Output = Result<Message, StoreError>> + Send;

    /// The most recent `limit` global messages, oldest first.
    fn get_messages(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Up to `limit` global messages strictly older than `before`, oldest
    /// first. An unknown `before` yields an empty page.
    fn get_messages_before_id(
        &self,
        before: MessageId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Message>, StoreError>> + Send;

    // -- Groups --

    /// Creates a group with `created_by` as its admin member.
    fn create_group(
        &self,
        name: &str,
        description: &str,
        created_by: UserId,
    ) -> impl Future<Output = Result<Group, StoreError>> + Send;

    fn get_group(&self, id: GroupId) -> impl Future<Output = Result<Group, StoreError>> + Send;

    /// Adds a member. Adding an existing member is a no-op.
    fn add_user_to_group(
        &self,
        group: GroupId,
        user: UserId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// # Errors
    /// - [`StoreError::CreatorCannotLeave`]: `user` created the group
    /// - [`StoreError::NotMember`]: `user` isn't in the group
    fn remove_user_from_group(
        &self,
        group: GroupId,
        user: UserId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn is_group_member(
        &self,
        group: GroupId,
        user: UserId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn get_group_members(
        &self,
        group: GroupId,
    ) -> impl Future<Output = Result<Vec<UserId>, StoreError>> + Send;

    /// Groups `user` belongs to, oldest first.
    fn get_user_groups(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<Group>, StoreError>> + Send;

    // -- Friendships --

    /// Opens a friend request from `from` to `to`.
    ///
    /// If the pair already has a pending or accepted row, that row is
    /// returned unchanged. A rejected row is re-opened as pending.
    fn create_friend_request(
        &self,
        from: UserId,
        to: UserId,
    ) -> impl Future<Output = Result<FriendRequest, StoreError>> + Send;

    /// # Errors
    /// [`StoreError::NotPending`] if the request was already answered.
    fn accept_friend_request(
        &self,
        id: FriendRequestId,
    ) -> impl Future<Output = Result<FriendRequest, StoreError>> + Send;

    /// # Errors
    /// [`StoreError::NotPending`] if the request was already answered.
    fn reject_friend_request(
        &self,
        id: FriendRequestId,
    ) -> impl Future<Output = Result<FriendRequest, StoreError>> + Send;

    /// Users with an accepted relationship to `user`, by username.
    fn get_friends(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<User>, StoreError>> + Send;

    /// Pending requests addressed to `user`, oldest first.
    fn get_pending_friend_requests(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<FriendRequest>, StoreError>> + Send;

    /// Returns `(from, to)` for a request.
    fn get_friend_request_users(
        &self,
        id: FriendRequestId,
    ) -> impl Future<Output = Result<(UserId, UserId), StoreError>> + Send;
}
