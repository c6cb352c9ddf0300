//! The consumer's latest-value cell.

use tokio::sync::watch;

/// Single-writer cell holding the most recently received payload.
///
/// Seeded with a fallback and only ever replaced by a non-empty payload,
/// so readers never observe a blank value. Readers subscribe through
/// [`LatestValue::subscribe`] and are woken on every change.
#[derive(Debug)]
pub struct LatestValue {
    tx: watch::Sender<String>,
}

impl LatestValue {
    /// Create a cell holding `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(fallback.into());
        Self { tx }
    }

    /// Current value.
    pub fn get(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Replace the value. Empty payloads are ignored; returns whether the
    /// cell was updated.
    pub fn replace(&self, payload: String) -> bool {
        if payload.is_empty() {
            return false;
        }
        self.tx.send_replace(payload);
        true
    }

    /// A receiver that observes every replacement.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_fallback() {
        let cell = LatestValue::new("2024-01-01T00:00:00.000Z");
        assert_eq!(cell.get(), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn empty_payload_never_blanks_the_cell() {
        let cell = LatestValue::new("a");
        assert!(!cell.replace(String::new()));
        assert_eq!(cell.get(), "a");
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let cell = LatestValue::new("a");
        let mut rx = cell.subscribe();
        assert!(cell.replace("b".to_owned()));
        assert!(rx.changed().await.is_ok());
        assert_eq!(*rx.borrow(), "b");
    }
}
