//! Behavioural tests for the in-memory store against the `Store` contract.

use parley_protocol::{FriendRequestId, GroupId, MessageId, UserStatus};
use parley_store::{
    FriendRequestStatus, MemberRole, MemoryStore, NewMessage, Store, StoreError, User,
};

async fn signup(store: &MemoryStore, name: &str) -> User {
    store.authenticate_user(name, "password").await.unwrap()
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_authenticate_unseen_username_creates_account() {
    let store = MemoryStore::new();

    let user = store.authenticate_user("Alice", "secret").await.unwrap();

    assert_eq!(user.username, "Alice");
    assert_eq!(user.status, UserStatus::Offline);
    let fetched = store.get_user(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
}

#[tokio::test]
async fn test_authenticate_existing_user_with_correct_password() {
    let store = MemoryStore::new();
    let first = store.authenticate_user("alice", "secret").await.unwrap();

    let second = store.authenticate_user("ALICE", "secret").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.username, "alice");
}

#[tokio::test]
async fn test_authenticate_wrong_password_is_rejected() {
    let store = MemoryStore::new();
    store.authenticate_user("alice", "secret").await.unwrap();

    let result = store.authenticate_user("alice", "wrong").await;

    assert!(matches!(result, Err(StoreError::InvalidCredentials)));
}

#[tokio::test]
async fn test_authenticate_empty_fields_are_invalid_input() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.authenticate_user("  ", "pw").await,
        Err(StoreError::InvalidInput(_))
    ));
    assert!(matches!(
        store.authenticate_user("alice", "").await,
        Err(StoreError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_get_user_by_username_ignores_case() {
    let store = MemoryStore::new();
    let bob = signup(&store, "Bob").await;

    let found = store.get_user_by_username("bOB").await.unwrap();

    assert_eq!(found.id, bob.id);
    assert!(matches!(
        store.get_user_by_username("carol").await,
        Err(StoreError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_update_user_status_is_visible() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    store
        .update_user_status(alice.id, UserStatus::Online)
        .await
        .unwrap();

    assert_eq!(
        store.get_user(alice.id).await.unwrap().status,
        UserStatus::Online
    );
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_message_fills_sender_name() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let saved = store
        .save_message(NewMessage::global(alice.id, "hello"))
        .await
        .unwrap();

    assert_eq!(saved.sender_name, "alice");
    assert_eq!(saved.content, "hello");
}

#[tokio::test]
async fn test_get_messages_returns_latest_oldest_first() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    for i in 0..5 {
        store
            .save_message(NewMessage::global(alice.id, format!("m{i}")))
            .await
            .unwrap();
    }

    let page = store.get_messages(3).await.unwrap();

    let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m2", "m3", "m4"]);
}

#[tokio::test]
async fn test_get_messages_before_id_pages_backwards() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let mut ids = Vec::new();
    for i in 0..5 {
        let saved = store
            .save_message(NewMessage::global(alice.id, format!("m{i}")))
            .await
            .unwrap();
        ids.push(saved.id);
    }

    let page = store.get_messages_before_id(ids[3], 2).await.unwrap();

    let contents: Vec<_> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m1", "m2"]);
}

#[tokio::test]
async fn test_get_messages_before_unknown_id_is_empty() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    store
        .save_message(NewMessage::global(alice.id, "hello"))
        .await
        .unwrap();

    let page = store
        .get_messages_before_id(MessageId::new(), 10)
        .await
        .unwrap();

    assert!(page.is_empty());
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_group_makes_creator_admin_member() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let group = store.create_group("rustaceans", "", alice.id).await.unwrap();

    assert_eq!(group.members.len(), 1);
    assert_eq!(group.members[0].user_id, alice.id);
    assert_eq!(group.members[0].role, MemberRole::Admin);
    assert!(store.is_group_member(group.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_create_group_empty_name_is_invalid() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let result = store.create_group("   ", "", alice.id).await;

    assert!(matches!(result, Err(StoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_add_user_to_group_is_idempotent() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;
    let group = store.create_group("g", "", alice.id).await.unwrap();

    store.add_user_to_group(group.id, bob.id).await.unwrap();
    store.add_user_to_group(group.id, bob.id).await.unwrap();

    let members = store.get_group_members(group.id).await.unwrap();
    assert_eq!(members, vec![alice.id, bob.id]);
}

#[tokio::test]
async fn test_remove_creator_is_refused() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let group = store.create_group("g", "", alice.id).await.unwrap();

    let result = store.remove_user_from_group(group.id, alice.id).await;

    assert!(matches!(result, Err(StoreError::CreatorCannotLeave(_))));
    assert!(store.is_group_member(group.id, alice.id).await.unwrap());
}

#[tokio::test]
async fn test_remove_non_member_is_refused() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;
    let group = store.create_group("g", "", alice.id).await.unwrap();

    let result = store.remove_user_from_group(group.id, bob.id).await;

    assert!(matches!(result, Err(StoreError::NotMember { .. })));
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let result = store.is_group_member(GroupId::new(), alice.id).await;

    assert!(matches!(result, Err(StoreError::GroupNotFound(_))));
}

#[tokio::test]
async fn test_get_user_groups_lists_only_memberships() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;
    let shared = store.create_group("shared", "", alice.id).await.unwrap();
    store.create_group("private", "", alice.id).await.unwrap();
    store.add_user_to_group(shared.id, bob.id).await.unwrap();

    let groups = store.get_user_groups(bob.id).await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, shared.id);
    assert_eq!(store.get_user_groups(alice.id).await.unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Friendships
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_friend_request_accept_makes_both_friends() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;

    let request = store.create_friend_request(alice.id, bob.id).await.unwrap();
    assert_eq!(request.status, FriendRequestStatus::Pending);
    assert_eq!(
        store.get_friend_request_users(request.id).await.unwrap(),
        (alice.id, bob.id)
    );

    store.accept_friend_request(request.id).await.unwrap();

    let alice_friends = store.get_friends(alice.id).await.unwrap();
    let bob_friends = store.get_friends(bob.id).await.unwrap();
    assert_eq!(alice_friends.len(), 1);
    assert_eq!(alice_friends[0].id, bob.id);
    assert_eq!(bob_friends[0].id, alice.id);
}

#[tokio::test]
async fn test_friend_request_duplicate_returns_existing_row() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;

    let first = store.create_friend_request(alice.id, bob.id).await.unwrap();
    let again = store.create_friend_request(alice.id, bob.id).await.unwrap();
    let reverse = store.create_friend_request(bob.id, alice.id).await.unwrap();

    assert_eq!(first.id, again.id);
    assert_eq!(first.id, reverse.id);
    assert_eq!(store.get_pending_friend_requests(bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_friend_request_after_rejection_reopens() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;
    let first = store.create_friend_request(alice.id, bob.id).await.unwrap();
    store.reject_friend_request(first.id).await.unwrap();

    let reopened = store.create_friend_request(alice.id, bob.id).await.unwrap();

    assert_eq!(reopened.id, first.id);
    assert_eq!(reopened.status, FriendRequestStatus::Pending);
}

#[tokio::test]
async fn test_answering_twice_is_not_pending() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;
    let bob = signup(&store, "bob").await;
    let request = store.create_friend_request(alice.id, bob.id).await.unwrap();
    store.accept_friend_request(request.id).await.unwrap();

    let result = store.reject_friend_request(request.id).await;

    assert!(matches!(result, Err(StoreError::NotPending(_))));
}

#[tokio::test]
async fn test_friend_request_to_self_is_invalid() {
    let store = MemoryStore::new();
    let alice = signup(&store, "alice").await;

    let result = store.create_friend_request(alice.id, alice.id).await;

    assert!(matches!(result, Err(StoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_unknown_friend_request_is_not_found() {
    let store = MemoryStore::new();

    let result = store.get_friend_request_users(FriendRequestId::new()).await;

    assert!(matches!(result, Err(StoreError::FriendRequestNotFound(_))));
}
