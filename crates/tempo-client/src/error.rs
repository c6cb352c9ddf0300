//! Error types for the stream consumer.
//!
//! Transport failures never reach the UI: the consumer absorbs them and
//! reconnects. [`ClientError`] only surfaces from setup code (config,
//! building the HTTP client, the one-off fallback request).

/// A connection attempt or an open connection failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be sent or the connection was refused.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// The server answered with something other than an event stream.
    #[error("unexpected content type: {0}")]
    ContentType(String),

    /// Reading from an open stream failed.
    #[error("read failed: {0}")]
    Read(String),
}

/// Errors raised outside the reconnect loop.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP client could not be built or a plain request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A stream transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
