//! # Garage Node
//!
//! HTTP server hosting garage wizard sessions.

use std::sync::Arc;

use garage_flows::SimulatedBackend;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod state;

use config::NodeConfig;
use state::AppState;

/// Run the garage node server.
pub async fn run_server(config: NodeConfig) -> anyhow::Result<()> {
    info!("🚗 Garage node starting...");
    info!(
        commit_timeout_ms = config.engine.commit_timeout_ms,
        latency_ms = config.backend.latency_ms,
        "using simulated backend"
    );

    let backend = Arc::new(SimulatedBackend::new(config.backend));
    let state = AppState::new(backend, config.engine);
    let app = api::router(state);

    info!("🌐 Listening on http://{}", config.addr);

    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = NodeConfig::from_env()?;
    run_server(config).await
}
