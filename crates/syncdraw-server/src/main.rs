//! SyncDraw relay server binary.

use std::sync::Arc;
use syncdraw_server::{AppState, config::ServerConfig, serve};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "syncdraw_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let listener = TcpListener::bind(config.bind).await?;
    let addr = listener.local_addr()?;
    info!("SyncDraw relay server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/<room>", addr);

    serve(listener, Arc::new(AppState::new())).await?;
    Ok(())
}
