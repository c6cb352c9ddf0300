//! Server binary for the Tempo web template.
//!
//! Loads configuration from the environment, builds the shared state and
//! serves the web application until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from environment variables
//! 3. Build the application state around a shutdown token
//! 4. Cancel the token on `Ctrl-C`
//! 5. Serve until the token fires and open streams have closed

use std::sync::Arc;

use tempo_web::{AppState, WebConfig, start_server};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the templates fail to
/// load, or the server cannot bind its address.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("tempo-server starting");

    // 2. Load configuration.
    let config = WebConfig::from_env()?;
    info!(
        host = config.host,
        port = config.port,
        stream_interval_ms = config.stream_interval.as_millis(),
        secure_cookies = config.secure_cookies,
        "Configuration loaded"
    );
    if let Err(e) = config.secrets.require() {
        warn!(error = %e, "form pages will fail until every secret is configured");
    }

    // 3. Build the shared state.
    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState::with_shutdown(config.clone(), shutdown.clone())?);

    // 4. Cancel everything on Ctrl-C.
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    // 5. Serve.
    start_server(&config, state).await?;

    info!("tempo-server stopped");
    Ok(())
}
