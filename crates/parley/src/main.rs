//! `parley-server`: the chat server over the in-memory store.
//!
//! Configuration comes from the environment (see [`ServerConfig`]);
//! `RUST_LOG` controls logging. Ctrl-C shuts down cleanly.

use parley::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ParleyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,parley=debug")),
        )
        .init();

    info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let server = ParleyServer::builder()
        .config(config)
        .build(MemoryStore::new())
        .await?;

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        info!("Ctrl-C received, shutting down");
        shutdown.cancel();
    });

    server.run().await
}
