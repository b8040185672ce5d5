//! Server Module
//!
//! HTTP layer over the trading desk: REST API, page routes and static
//! assets, served with axum.

mod api;
mod types;

pub use api::{api_router, create_router, AppState};
pub use types::*;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::desk::TradingDesk;

/// Start the HTTP server and run until Ctrl+C / SIGTERM
pub async fn start_server(desk: Arc<TradingDesk>, config: &ServerConfig) -> anyhow::Result<()> {
    let state = AppState {
        desk,
        default_historic_limit: config.default_historic_limit,
    };
    let app = create_router(state, &config.static_dir);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Perpguin server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C signal"),
            Err(e) => tracing::error!("Failed to install Ctrl+C handler: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received SIGTERM signal");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
