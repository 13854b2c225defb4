//! The auth handshake.
//!
//! A new connection gets exactly one chance: its first frame must be an
//! `auth` message, sent within the read deadline. The store decides
//! whether the credentials are good (an unseen username signs up). The
//! answer is written directly on the socket, before any session exists,
//! so a rejected client never touches the registry.

use std::time::Duration;

use parley_protocol::{
    AuthResponse, Codec, Credentials, Envelope, ErrorCode, Event, MessageType, Request,
};
use parley_session::write_event;
use parley_store::{Store, StoreError, User};
use parley_transport::{FrameReader, FrameWriter};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::ParleyError;

/// Deadlines for the handshake.
#[derive(Debug, Clone, Copy)]
pub struct AuthDeadlines {
    pub read: Duration,
    pub write: Duration,
}

/// Runs the handshake and returns the authenticated user.
///
/// # Errors
/// Any error means the caller must close the connection without
/// registering a session:
/// - [`ParleyError::AuthTimeout`] / [`ParleyError::HandshakeClosed`]: no
///   `auth` arrived
/// - [`ParleyError::Protocol`]: the frame or its payload didn't decode
/// - [`ParleyError::ExpectedAuth`]: some other message came first
/// - [`ParleyError::AuthRejected`]: the store refused the credentials
pub async fn negotiate<R, W, S, C>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    store: &S,
    codec: &C,
    deadlines: AuthDeadlines,
) -> Result<User, ParleyError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Store,
    C: Codec,
{
    let frame = match tokio::time::timeout(deadlines.read, reader.recv()).await {
        Ok(Ok(Some(frame))) => frame,
        Ok(Ok(None)) => return Err(ParleyError::HandshakeClosed),
        Ok(Err(e)) => return Err(ParleyError::Transport(e)),
        Err(_) => return Err(ParleyError::AuthTimeout(deadlines.read)),
    };

    let envelope: Envelope = codec.decode(&frame)?;
    let credentials = match envelope.kind {
        MessageType::Auth => match Request::from_envelope(envelope)? {
            Request::Auth(credentials) => credentials,
            other => return Err(ParleyError::ExpectedAuth(other.kind())),
        },
        other => {
            let reply = Event::error(ErrorCode::NotAuthenticated, "authenticate first");
            send(writer, codec, &reply, deadlines.write).await?;
            return Err(ParleyError::ExpectedAuth(other));
        }
    };

    match authenticate(store, &credentials).await {
        Ok(user) => {
            let reply = Event::AuthResponse(AuthResponse::accepted(user.id, &user.username));
            send(writer, codec, &reply, deadlines.write).await?;
            tracing::info!(user_id = %user.id, username = %user.username, "authenticated");
            Ok(user)
        }
        Err(e) => {
            let reason = match &e {
                StoreError::InvalidCredentials => "invalid credentials".to_string(),
                StoreError::InvalidInput(msg) => msg.clone(),
                _ => "internal server error".to_string(),
            };
            tracing::info!(username = %credentials.username, error = %e, "authentication failed");
            let reply = Event::AuthResponse(AuthResponse::rejected(reason.clone()));
            // The connection is closing either way.
            let _ = send(writer, codec, &reply, deadlines.write).await;
            match e {
                StoreError::InvalidCredentials | StoreError::InvalidInput(_) => {
                    Err(ParleyError::AuthRejected(reason))
                }
                other => Err(ParleyError::Store(other)),
            }
        }
    }
}

async fn authenticate<S: Store>(store: &S, credentials: &Credentials) -> Result<User, StoreError> {
    store
        .authenticate_user(credentials.username.trim(), &credentials.password)
        .await
}

async fn send<W, C>(
    writer: &mut FrameWriter<W>,
    codec: &C,
    event: &Event,
    deadline: Duration,
) -> Result<(), ParleyError>
where
    W: AsyncWrite + Unpin,
    C: Codec,
{
    write_event(writer, codec, event, deadline).await?;
    Ok(())
}
