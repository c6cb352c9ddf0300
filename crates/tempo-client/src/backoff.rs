//! Bounded exponential reconnect backoff.

use std::time::Duration;

/// Shortest delay between reconnect attempts, whatever the policy or the
/// server's `retry:` hint says.
pub const MIN_DELAY: Duration = Duration::from_millis(100);

/// Delay policy between reconnect attempts.
///
/// Attempt `n` (1-based) waits `initial * 2^(n-1)`, capped at `max` and
/// never shorter than [`MIN_DELAY`].
/// With `max_attempts` set, attempt `max_attempts + 1` gets no delay and
/// the consumer gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the first reconnect attempt.
    pub initial: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Attempts allowed after a connection is lost; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
            max_attempts: Some(10),
        }
    }
}

impl Backoff {
    /// Delay before reconnect attempt `attempt`, or `None` once the
    /// attempt budget is spent.
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 {
            return Some(Duration::ZERO);
        }
        if self.max_attempts.is_some_and(|max| attempt > max) {
            return None;
        }
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.initial.saturating_mul(factor).min(self.max).max(MIN_DELAY))
    }

    /// Apply a server `retry:` hint as the new base delay.
    #[must_use]
    pub fn with_initial(self, initial: Duration) -> Self {
        Self {
            initial: initial.min(self.max).max(MIN_DELAY),
            ..self
        }
    }
}
