//! Terminal rendering of the latest value.

use chrono::{DateTime, FixedOffset, Local};

/// Format an ISO-8601 payload as a local `HH:MM:SS` wall-clock time.
///
/// Payloads that do not parse are shown verbatim so the display never
/// goes blank.
pub fn render_time(payload: &str) -> String {
    DateTime::parse_from_rfc3339(payload).map_or_else(
        |_| payload.to_owned(),
        |at: DateTime<FixedOffset>| at.with_timezone(&Local).format("%H:%M:%S").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_valid_timestamps_as_clock_time() {
        let rendered = render_time("2024-01-01T00:00:01.000Z");
        assert_eq!(rendered.len(), 8);
        assert!(rendered.ends_with(":01"));
    }

    #[test]
    fn passes_through_unparseable_payloads() {
        assert_eq!(render_time("n/a"), "n/a");
    }
}
