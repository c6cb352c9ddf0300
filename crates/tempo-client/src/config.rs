//! Configuration for the terminal consumer.
//!
//! All configuration is loaded from environment variables. The consumer
//! needs the server's base URL and its reconnect policy.

use std::time::Duration;

use crate::backoff::Backoff;
use crate::error::ClientError;

/// Complete `tempo-watch` configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Base URL of the server (e.g. `http://127.0.0.1:8080`).
    pub base_url: String,
    /// Path of the push stream.
    pub stream_path: String,
    /// Reconnect policy.
    pub backoff: Backoff,
}

impl WatchConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `TEMPO_URL` -- server base URL (default `http://127.0.0.1:8080`)
    /// - `TEMPO_STREAM_PATH` -- stream route (default `/sse/time`)
    /// - `RECONNECT_INITIAL_MS` -- first reconnect delay (default 1000)
    /// - `RECONNECT_MAX_MS` -- delay cap (default 30000)
    /// - `RECONNECT_MAX_ATTEMPTS` -- attempts before giving up, `0` for
    ///   unbounded (default 10)
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if a variable is malformed.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`WatchConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("TEMPO_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080".to_owned())
            .trim_end_matches('/')
            .to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "TEMPO_URL must be an http(s) URL, got {base_url}"
            )));
        }

        let stream_path = lookup("TEMPO_STREAM_PATH").unwrap_or_else(|| "/sse/time".to_owned());

        let initial_ms: u64 = parse_or(&lookup, "RECONNECT_INITIAL_MS", 1000)?;
        let max_ms: u64 = parse_or(&lookup, "RECONNECT_MAX_MS", 30_000)?;
        let max_attempts: u32 = parse_or(&lookup, "RECONNECT_MAX_ATTEMPTS", 10)?;

        Ok(Self {
            base_url,
            stream_path,
            backoff: Backoff {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms.max(initial_ms)),
                max_attempts: (max_attempts > 0).then_some(max_attempts),
            },
        })
    }

    /// Full URL of the push stream.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.stream_path)
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ClientError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| ClientError::Config(format!("invalid {name}: {e}")))
    })
}
