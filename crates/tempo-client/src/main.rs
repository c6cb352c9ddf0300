//! Terminal consumer for the Tempo push stream.
//!
//! Fetches the index loader data once for the fallback timestamp, then
//! subscribes to the time stream and prints every update of the
//! latest-value cell as a local wall-clock time.
//!
//! # Architecture
//!
//! ```text
//! GET / (JSON) --> fallback --> LatestValue <-- Consumer <-- GET /sse/time
//!                                   |
//!                                   v
//!                                stdout
//! ```
//!
//! `Ctrl-C` closes the subscription, cancelling any pending reconnect.

use chrono::Utc;
use tempo_client::render::render_time;
use tempo_client::{Consumer, ConsumerOptions, HttpTransport, WatchConfig};
use tempo_types::{TIME_EVENT, iso_timestamp};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// fetches the fallback value and runs the consumer until `Ctrl-C` or
/// until the reconnect budget is exhausted.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the HTTP client cannot
/// be built.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("tempo-watch starting");

    let config = WatchConfig::from_env()?;
    info!(
        base_url = config.base_url,
        stream_url = config.stream_url(),
        reconnect_initial_ms = config.backoff.initial.as_millis(),
        reconnect_max_ms = config.backoff.max.as_millis(),
        reconnect_max_attempts = config.backoff.max_attempts.unwrap_or(0),
        "configuration loaded"
    );

    let transport = HttpTransport::new(config.stream_url())?;

    // The fallback comes from an ordinary request, not from the stream.
    let fallback = match transport.fetch_index_data(&config.base_url).await {
        Ok(data) => data.time,
        Err(e) => {
            warn!(error = %e, "loader request failed, seeding with local time");
            iso_timestamp(Utc::now())
        }
    };

    let options = ConsumerOptions {
        event_name: TIME_EVENT.to_owned(),
        backoff: config.backoff,
    };
    let subscription = Consumer::new(transport, options).spawn(fallback);

    let mut latest = subscription.watch_latest();
    let mut state = subscription.watch_state();
    println!("{}", render_time(&latest.borrow_and_update()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, closing subscription");
                break;
            }
            changed = latest.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", render_time(&latest.borrow_and_update()));
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                info!(state = current.as_str(), "connection state changed");
                if current.is_terminal() {
                    break;
                }
            }
        }
    }

    subscription.close().await;
    info!("tempo-watch stopped");

    Ok(())
}
