//! Connection state of a consumer.

use std::time::Duration;

/// Where the consumer is in its connect/reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected yet; the cell shows the fallback value.
    #[default]
    Disconnected,
    /// A stream is open and events are being applied.
    Connected,
    /// The stream was lost; waiting `retry_in` before attempt `attempt`.
    Reconnecting {
        /// 1-based attempt number since the last successful connection.
        attempt: u32,
        /// Delay before this attempt.
        retry_in: Duration,
    },
    /// The reconnect budget is spent; the cell keeps its last value.
    Exhausted {
        /// Number of failed attempts.
        attempts: u32,
    },
    /// The subscription was closed on purpose.
    Closed,
}

impl ConnectionState {
    /// Whether the consumer will not change state again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::Closed)
    }

    /// Short name for logging and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Exhausted { .. } => "exhausted",
            Self::Closed => "closed",
        }
    }
}
