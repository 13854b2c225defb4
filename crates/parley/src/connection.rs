//! One connection from accept to teardown.
//!
//! The flow is:
//!   1. Handshake (see [`auth`](crate::auth)) on the raw framed halves
//!   2. Create the session and register it
//!   3. Queue the login snapshot on the session's own mailbox, then mark
//!      the user online (which announces them to everyone)
//!   4. Run the two pumps: outbound in its own task, inbound here
//!   5. Whichever pump stops first closes the session, which stops the
//!      other; then teardown runs once
//!
//! Teardown unregisters only this session (a replacement may already own
//! the slot) and marks the user offline only if nothing replaced it.

use std::sync::Arc;

use parley_protocol::{Codec, Envelope};
use parley_session::{Session, run_outbound};
use parley_store::Store;
use parley_transport::{FrameReader, TcpConnection};
use tokio::io::AsyncRead;

use crate::ParleyError;
use crate::auth::{self, AuthDeadlines};
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: Store>(
    conn: TcpConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), ParleyError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::debug!(%conn_id, %peer, "handling new connection");

    let (mut reader, mut writer) = conn.into_split();

    let deadlines = AuthDeadlines {
        read: state.config.auth_read_timeout,
        write: state.config.auth_write_timeout,
    };
    let handshake = tokio::select! {
        _ = state.shutdown.cancelled() => return Ok(()),
        result = auth::negotiate(&mut reader, &mut writer, state.store.as_ref(), &state.codec, deadlines) => result,
    };
    let user = match handshake {
        Ok(user) => user,
        Err(e) => {
            let _ = tokio::time::timeout(deadlines.write, writer.close()).await;
            return Err(e);
        }
    };

    // --- Session ---
    let (session, mailbox) = Session::new(
        conn_id,
        user.id,
        user.username.clone(),
        state.config.session.mailbox_capacity,
        &state.shutdown,
    );
    state.registry.register(Arc::clone(&session)).await;
    state.router.welcome(&session).await;
    state.presence.online(user.id).await;

    // --- Pumps ---
    let outbound = {
        let session = Arc::clone(&session);
        let codec = state.codec;
        let config = state.config.session.clone();
        tokio::spawn(async move {
            let result =
                run_outbound(mailbox, writer, &codec, &config, session.cancel_token()).await;
            session.close();
            result
        })
    };

    let inbound = run_inbound(&mut reader, &session, &state).await;
    session.close();

    match &inbound {
        Ok(()) => tracing::debug!(%conn_id, user_id = %user.id, "inbound pump stopped"),
        Err(e) => tracing::debug!(%conn_id, user_id = %user.id, error = %e, "inbound pump failed"),
    }
    match outbound.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(%conn_id, user_id = %user.id, error = %e, "outbound pump failed"),
        Err(e) => tracing::error!(%conn_id, user_id = %user.id, error = %e, "outbound pump panicked"),
    }

    // --- Teardown ---
    state.registry.unregister(user.id, &session).await;
    state
        .presence
        .offline_unless_registered(user.id, &state.registry)
        .await;
    tracing::info!(%conn_id, user_id = %user.id, "session ended");

    inbound
}

/// Reads frames and routes them one at a time, in arrival order.
///
/// Stops cleanly on end of stream or when the session is closed. A frame
/// that isn't a valid envelope ends the connection; a bad payload inside a
/// valid envelope is the router's business and only earns an error reply.
async fn run_inbound<R, S>(
    reader: &mut FrameReader<R>,
    session: &Session,
    state: &ServerState<S>,
) -> Result<(), ParleyError>
where
    R: AsyncRead + Unpin,
    S: Store,
{
    let cancel = session.cancel_token();
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = reader.recv() => frame?,
        };
        let Some(frame) = frame else {
            tracing::info!(user_id = %session.user_id(), "connection closed by peer");
            return Ok(());
        };
        let envelope: Envelope = state.codec.decode(&frame)?;
        state.router.dispatch(session, envelope).await;
    }
}
