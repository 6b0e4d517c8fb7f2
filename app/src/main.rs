//! Headless stream notifier: polls followed channels and raises desktop
//! notifications, controlled through a local HTTP + WebSocket API.

use tracing_subscriber::EnvFilter;

use stream_notifier_lib::app::SharedState;
use stream_notifier_lib::{background, notification, server, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting stream notifier");

    let (db, config, dir) = stream_notifier_lib::init_foundation()?;
    let state = SharedState::new(db, config, dir);

    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(server_state).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let s = state.clone();
    tokio::spawn(async move { background::token_refresh_loop(s).await });

    let s = state.clone();
    tokio::spawn(async move { background::status_broadcast_loop(s).await });

    notification::initialize(&state).await;

    tracing::info!(
        port = state.server_port(),
        "Stream notifier running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    shutdown::graceful_shutdown(&state).await;

    if let Err(e) = server_handle.await {
        tracing::warn!("Server task ended abnormally: {e}");
    }
    Ok(())
}
