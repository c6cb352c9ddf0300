//! The unit of data carried by the push stream.
//!
//! A [`StreamEvent`] is created once per producer tick, transmitted once
//! and never persisted. On the wire it becomes an `event:` line followed
//! by a `data:` line.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Event name used by the time stream.
pub const TIME_EVENT: &str = "time";

/// Event name a receiver assumes when a frame carries no `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// A single named event pushed from the server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Event name (`time` for the clock stream).
    pub name: String,
    /// String payload (an ISO-8601 timestamp for the clock stream).
    pub payload: String,
}

impl StreamEvent {
    /// Create an event with an arbitrary name and payload.
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Create a `time` event stamped with the given instant.
    pub fn time(at: DateTime<Utc>) -> Self {
        Self::new(TIME_EVENT, iso_timestamp(at))
    }

    /// Whether this event carries the given name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Format an instant as ISO-8601 with millisecond precision and a `Z`
/// suffix, e.g. `2024-01-01T00:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
