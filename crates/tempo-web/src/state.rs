//! Shared application state.
//!
//! [`AppState`] is built once at startup and shared by every handler
//! behind an `Arc`. It holds no per-connection data: each stream
//! connection owns its producer task, channel and cancellation token.

use std::sync::Arc;

use tempo_stream::StreamProducer;
use tempo_types::TIME_EVENT;
use tokio_util::sync::CancellationToken;

use crate::config::WebConfig;
use crate::error::WebError;
use crate::templates::Templates;

/// State shared by all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Loaded configuration.
    pub config: WebConfig,
    /// Producer for the `time` stream.
    pub producer: Arc<StreamProducer>,
    /// Compiled page templates.
    pub templates: Templates,
    /// Server shutdown signal; every stream connection's token is a child
    /// of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the state with a fresh shutdown token.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream interval is zero or a template
    /// fails to parse.
    pub fn new(config: WebConfig) -> Result<Self, WebError> {
        Self::with_shutdown(config, CancellationToken::new())
    }

    /// Build the state around an existing shutdown token.
    ///
    /// # Errors
    ///
    /// See [`AppState::new`].
    pub fn with_shutdown(config: WebConfig, shutdown: CancellationToken) -> Result<Self, WebError> {
        let producer = StreamProducer::new(config.stream_interval, TIME_EVENT)?;
        Ok(Self {
            config,
            producer: Arc::new(producer),
            templates: Templates::new()?,
            shutdown,
        })
    }

    /// Number of open stream connections.
    pub fn active_streams(&self) -> usize {
        self.producer.active_connections()
    }
}
