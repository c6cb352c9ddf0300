//! The reconnecting consumer loop and its subscription handle.

use std::sync::Arc;

use futures::StreamExt;
use tempo_stream::{Frame, SseDecoder};
use tempo_types::TIME_EVENT;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::latest::LatestValue;
use crate::state::ConnectionState;
use crate::transport::Transport;

/// What to listen for and how to reconnect.
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Only events with this name update the cell.
    pub event_name: String,
    /// Reconnect policy.
    pub backoff: Backoff,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            event_name: TIME_EVENT.to_owned(),
            backoff: Backoff::default(),
        }
    }
}

/// A consumer bound to one transport.
#[derive(Debug)]
pub struct Consumer<T> {
    transport: Arc<T>,
    options: ConsumerOptions,
}

/// How one open connection ended.
enum StreamEnd {
    Cancelled,
    Lost,
}

impl<T: Transport> Consumer<T> {
    /// Create a consumer.
    pub fn new(transport: T, options: ConsumerOptions) -> Self {
        Self {
            transport: Arc::new(transport),
            options,
        }
    }

    /// Subscribe: seed the cell with `fallback` and start the consumer
    /// task. The returned [`Subscription`] unsubscribes when closed or
    /// dropped.
    pub fn spawn(self, fallback: impl Into<String>) -> Subscription {
        let cell = LatestValue::new(fallback);
        let latest = cell.subscribe();
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            self.run(&cell, &state_tx, &token).await;
            state_tx.send_replace(ConnectionState::Closed);
        });

        Subscription {
            latest,
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Connect, apply events, reconnect with backoff, until cancelled or
    /// the attempt budget runs out.
    async fn run(
        &self,
        cell: &LatestValue,
        state: &watch::Sender<ConnectionState>,
        cancel: &CancellationToken,
    ) {
        let mut decoder = SseDecoder::new();
        let mut backoff = self.options.backoff;
        let mut attempt: u32 = 0;

        loop {
            let last_event_id = decoder.last_event_id().map(str::to_owned);
            let connected = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                result = self.transport.connect(last_event_id) => result,
            };

            match connected {
                Ok(mut stream) => {
                    // Only a connection that delivers an event earns a fresh
                    // attempt budget; accept-then-close keeps backing off.
                    let mut delivered = false;
                    state.send_replace(ConnectionState::Connected);
                    info!(event = self.options.event_name, "event stream connected");

                    let end = loop {
                        let chunk = tokio::select! {
                            biased;
                            () = cancel.cancelled() => break StreamEnd::Cancelled,
                            chunk = stream.next() => chunk,
                        };
                        match chunk {
                            Some(Ok(bytes)) => {
                                let mut overflowed = false;
                                for frame in decoder.push(&bytes) {
                                    if matches!(frame, Frame::Event(_)) {
                                        delivered = true;
                                    }
                                    match frame {
                                        Frame::Event(event) if event.is_named(&self.options.event_name) => {
                                            cell.replace(event.payload);
                                        }
                                        Frame::Event(event) => {
                                            debug!(name = event.name, "ignoring event with other name");
                                        }
                                        Frame::Retry(delay) => {
                                            backoff = backoff.with_initial(delay);
                                        }
                                        Frame::Overflow => overflowed = true,
                                    }
                                }
                                if overflowed {
                                    warn!("event stream sent an oversized line");
                                    break StreamEnd::Lost;
                                }
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "event stream read failed");
                                break StreamEnd::Lost;
                            }
                            None => {
                                info!("event stream closed by server");
                                break StreamEnd::Lost;
                            }
                        }
                    };

                    decoder.reset();
                    if matches!(end, StreamEnd::Cancelled) {
                        return;
                    }
                    if delivered {
                        attempt = 0;
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt, "event stream connect failed");
                }
            }

            attempt = attempt.saturating_add(1);
            let Some(retry_in) = backoff.delay(attempt) else {
                let attempts = attempt.saturating_sub(1);
                warn!(attempts, "giving up on event stream");
                state.send_replace(ConnectionState::Exhausted { attempts });
                cancel.cancelled().await;
                return;
            };

            state.send_replace(ConnectionState::Reconnecting { attempt, retry_in });
            debug!(attempt, retry_in_ms = retry_in.as_millis(), "scheduling reconnect");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(retry_in) => {}
            }
        }
    }
}

/// Handle to a running consumer.
///
/// Dropping the handle cancels the consumer, including any pending
/// reconnect. [`Subscription::close`] does the same and waits for the
/// task to finish.
#[derive(Debug)]
pub struct Subscription {
    latest: watch::Receiver<String>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Current value of the cell.
    pub fn latest(&self) -> String {
        self.latest.borrow().clone()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver woken on every cell change.
    pub fn watch_latest(&self) -> watch::Receiver<String> {
        self.latest.clone()
    }

    /// A receiver woken on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Unsubscribe and wait for the consumer task to stop.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "consumer task ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
