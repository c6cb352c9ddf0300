//! `Server-Timing` header support.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Response header name.
pub const SERVER_TIMING: &str = "server-timing";

/// Named durations collected while handling one request.
#[derive(Debug, Clone, Default)]
pub struct Timings {
    entries: Vec<(String, Duration)>,
}

impl Timings {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` and record its duration under `name`.
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = f();
        self.record(name, started.elapsed());
        out
    }

    /// Record a duration measured elsewhere.
    pub fn record(&mut self, name: &str, duration: Duration) {
        self.entries.push((name.to_owned(), duration));
    }

    /// Header value: `root-loader;desc="root loader";dur=0.42, ...`.
    pub fn header_value(&self) -> String {
        let mut out = String::new();
        for (i, (name, duration)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let token: String = name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            let desc = name.replace('"', "");
            let _ = write!(
                out,
                "{token};desc=\"{desc}\";dur={:.2}",
                duration.as_secs_f64() * 1000.0
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_entries_in_order() {
        let mut timings = Timings::new();
        timings.record("root loader", Duration::from_micros(1500));
        timings.record("index", Duration::from_millis(2));
        assert_eq!(
            timings.header_value(),
            "root-loader;desc=\"root loader\";dur=1.50, index;desc=\"index\";dur=2.00"
        );
    }

    #[test]
    fn time_returns_the_closure_result() {
        let mut timings = Timings::new();
        assert_eq!(timings.time("work", || 7), 7);
        assert!(timings.header_value().starts_with("work;"));
    }
}
