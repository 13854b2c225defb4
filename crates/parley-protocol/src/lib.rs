//! Wire protocol for Parley.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`MessageType`], the id newtypes): the
//!   outer structure every frame shares.
//! - **Payloads** ([`Request`], [`Event`]): typed content, one sum type
//!   per direction, decoded from an envelope by its type tag.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become
//!   the bytes of one frame.
//! - **Errors** ([`ProtocolError`], [`ErrorCode`]): what can go wrong,
//!   and the numeric codes reported to clients.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope → Request) → Router (handlers)
//! ```

mod code;
mod codec;
mod error;
mod payload;
mod types;

pub use code::ErrorCode;
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use payload::{
    AddFriend, AnswerFriend, AuthResponse, ChatMessage, CreateGroup, Credentials, ErrorPayload,
    Event, FriendList, FriendRequestNotice, FriendResponseNotice, GroupInfo, GroupList,
    GroupMembership, GroupRef, LoadMessages, MessageHistory, NoticeStatus, NotificationPayload,
    PostDirect, PostGlobal, PostGroup, Request, StatusUpdate, UserInfo,
};
pub use types::{
    Envelope, FriendRequestId, GroupId, MessageId, MessageType, UserId, UserStatus,
};
