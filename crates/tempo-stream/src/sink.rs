//! The transport-facing side of a producer.

use core::future::Future;

use tempo_types::StreamEvent;
use tokio::sync::mpsc;

/// The receiving end of the connection has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Somewhere a producer can write events.
///
/// A write either succeeds or reports [`SinkClosed`]; there is no partial
/// failure and no retry at this layer.
pub trait EventSink: Send {
    /// Deliver one event.
    fn send(&mut self, event: StreamEvent) -> impl Future<Output = Result<(), SinkClosed>> + Send;
}

impl EventSink for mpsc::Sender<StreamEvent> {
    async fn send(&mut self, event: StreamEvent) -> Result<(), SinkClosed> {
        mpsc::Sender::send(self, event)
            .await
            .map_err(|_closed| SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_once_receiver_is_dropped() {
        let (mut tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = EventSink::send(&mut tx, StreamEvent::new("time", "x")).await;
        assert_eq!(result, Err(SinkClosed));
    }
}
