//! Fanout Router
//!
//! Accepts notification events over HTTP and fans them out by discriminant.
//!
//! This service:
//! - Validates inbound notifications at `POST /notification`
//! - Emits each one onto a bounded, keyed stream (fail-fast when full)
//! - Routes every event to exactly one known-value channel or the catch-all
//! - Logs receipt on each channel's consumer

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fanout_router::{
    api, config, pipeline::FanoutPipeline, sinks::LoggingSink, state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to FANOUT_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting fanout router");
    info!(
        listen_addr = %config.listen_addr,
        field = %config.routing.field,
        known_values = ?config.routing.known_values,
        unmatched_channel = %config.routing.unmatched_channel,
        "Configuration loaded"
    );

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pipeline = FanoutPipeline::spawn(&config.routing, Arc::new(LoggingSink), shutdown_rx.clone())?;
    let state = AppState::new(pipeline.producer(), pipeline.stats(), config.routing.field);

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    // Signal shutdown; the router drains what is already buffered
    let _ = shutdown_tx.send(true);

    info!("Waiting for pipeline to drain...");
    if tokio::time::timeout(Duration::from_secs(10), pipeline.join())
        .await
        .is_err()
    {
        warn!("Pipeline did not drain in time");
    }

    info!("Fanout router shutdown complete");
    Ok(())
}
