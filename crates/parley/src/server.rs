//! `ParleyServer` builder and accept loop.
//!
//! This is the entry point for running a Parley chat server. It wires the
//! layers together: transport → protocol → session → router, plus the
//! three background tasks (broadcast coordinator, presence monitor,
//! notification pruner).

use std::net::SocketAddr;
use std::sync::Arc;

use parley_presence::Presence;
use parley_protocol::JsonCodec;
use parley_router::{NotificationCenter, Router};
use parley_session::{BroadcastCoordinator, Registry, broadcast_channel};
use parley_store::{MemoryStore, Store};
use parley_transport::{TcpTransport, Transport};
use tokio_util::sync::CancellationToken;

use crate::connection::handle_connection;
use crate::{ParleyError, ServerConfig};

/// Shared state handed to every connection task.
pub(crate) struct ServerState<S: Store> {
    pub(crate) store: Arc<S>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) presence: Arc<Presence<S>>,
    pub(crate) notifications: Arc<NotificationCenter>,
    pub(crate) router: Router<S>,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
    pub(crate) shutdown: CancellationToken,
}

/// Builder for configuring and starting a Parley server.
///
/// # Example
///
/// ```rust,no_run
/// use parley::prelude::*;
///
/// # async fn start() -> Result<(), ParleyError> {
/// let server = ParleyServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ParleyServerBuilder {
    config: ServerConfig,
}

impl ParleyServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server around `store`.
    pub async fn build<S: Store>(self, store: S) -> Result<ParleyServer<S>, ParleyError> {
        let config = self.config.validated();
        let transport = TcpTransport::bind(&config.bind_addr).await?;

        let store = Arc::new(store);
        let registry = Arc::new(Registry::new());
        let (broadcaster, coordinator) =
            broadcast_channel(config.broadcast_capacity, Arc::clone(&registry));
        let presence = Arc::new(Presence::new(
            Arc::clone(&store),
            broadcaster.clone(),
            config.presence.clone(),
        ));
        let notifications = Arc::new(NotificationCenter::new(Arc::clone(&registry)));
        let router = Router::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            broadcaster,
            Arc::clone(&presence),
            Arc::clone(&notifications),
            config.router.clone(),
        );

        let state = Arc::new(ServerState {
            store,
            registry,
            presence,
            notifications,
            router,
            codec: JsonCodec,
            config,
            shutdown: CancellationToken::new(),
        });

        Ok(ParleyServer {
            transport,
            coordinator,
            state,
        })
    }
}

impl Default for ParleyServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parley server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParleyServer<S: Store = MemoryStore> {
    transport: TcpTransport,
    coordinator: BroadcastCoordinator,
    state: Arc<ServerState<S>>,
}

impl ParleyServer {
    pub fn builder() -> ParleyServerBuilder {
        ParleyServerBuilder::new()
    }
}

impl<S: Store> ParleyServer<S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ParleyError> {
        Ok(self.transport.local_addr()?)
    }

    /// The token that stops everything: the accept loop, the background
    /// tasks, and every session.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.state.store
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.state.registry
    }

    /// Runs the server until the shutdown token is cancelled.
    ///
    /// Spawns the background tasks, then accepts connections and gives
    /// each one its own task.
    pub async fn run(self) -> Result<(), ParleyError> {
        let ParleyServer {
            mut transport,
            coordinator,
            state,
        } = self;
        let shutdown = state.shutdown.clone();

        tokio::spawn(coordinator.run(shutdown.clone()));
        tokio::spawn(Arc::clone(&state.presence).run(shutdown.clone()));
        tokio::spawn(Arc::clone(&state.notifications).run_pruner(
            state.config.notification_prune_interval,
            state.config.notification_retention,
            shutdown.clone(),
        ));

        tracing::info!(addr = ?transport.local_addr().ok(), "Parley server running");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }

        let online = state.registry.len().await;
        tracing::info!(online, "Parley server stopped");
        Ok(())
    }
}
