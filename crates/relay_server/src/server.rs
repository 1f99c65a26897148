//! Listener setup and serve loop

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{RelayError, Result};
use crate::router::{build_router, RelayState};

/// Bind the relay listener
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until `shutdown` is cancelled and every open stream has ended.
///
/// Streams end when their channel closes, so the producer set must be torn
/// down for a graceful shutdown to complete.
pub async fn serve(listener: TcpListener, state: RelayState, shutdown: CancellationToken) -> Result<()> {
    let local = listener.local_addr().map_err(RelayError::Serve)?;
    info!(addr = %local, "relay server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(RelayError::Serve)?;

    info!("relay server stopped");
    Ok(())
}
