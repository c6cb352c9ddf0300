//! Wall-clock source for event payloads.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Source of the current time stamped into each event.
pub trait Clock: Send + Sync + 'static {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A deterministic clock that starts at a fixed instant and advances by a
/// fixed step on every read.
///
/// Used to make payload sequences predictable under a paused Tokio clock.
#[derive(Debug)]
pub struct SteppingClock {
    start: DateTime<Utc>,
    step_millis: i64,
    reads: AtomicI64,
}

impl SteppingClock {
    /// Create a clock whose first read returns `start + step`.
    pub fn new(start: DateTime<Utc>, step: std::time::Duration) -> Self {
        Self {
            start,
            step_millis: i64::try_from(step.as_millis()).unwrap_or(i64::MAX),
            reads: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.reads.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        let offset = ChronoDuration::milliseconds(self.step_millis.saturating_mul(n));
        self.start.checked_add_signed(offset).unwrap_or(self.start)
    }
}
