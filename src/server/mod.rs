//! HTTP ingestion endpoint.

pub mod error;
pub mod routes;

pub use routes::{router, AppState};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serve the ingestion router until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    info!("Yell endpoint listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Yell endpoint stopped");
    Ok(())
}
