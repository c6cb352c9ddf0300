//! Server Stream Producer.
//!
//! A [`StreamProducer`] turns a fixed period into a sequence of named
//! events for one connection. Each connection runs its own producer task
//! which suspends between ticks and wakes on whichever comes first: the
//! next tick or the connection's cancellation token.
//!
//! Cancellation sources for a connection:
//!
//! - the client disconnects (the sink's receiver is dropped, so the next
//!   write fails),
//! - the server shuts down (the per-connection token is a child of the
//!   server's shutdown token),
//! - the handler drops its [`ProducerHandle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tempo_types::{ConnectionId, StreamEvent, TIME_EVENT, iso_timestamp};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::sink::EventSink;

/// Period of the time stream.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1000);

/// Errors raised when building a producer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProducerError {
    /// The period must be non-zero.
    #[error("stream period must be greater than zero")]
    ZeroPeriod,

    /// The event name must be non-empty and single-line.
    #[error("invalid event name: {0:?}")]
    InvalidEventName(String),
}

/// Why a producer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    /// The cancellation token fired.
    Cancelled,
    /// A write to the sink failed; the client is gone.
    TransportClosed,
}

impl ProducerExit {
    /// Short name for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::TransportClosed => "transport_closed",
        }
    }
}

/// Emits one named event per period until cancelled.
#[derive(Debug, Clone)]
pub struct StreamProducer<C = SystemClock> {
    period: Duration,
    event_name: String,
    clock: C,
    active: Arc<AtomicUsize>,
}

impl StreamProducer<SystemClock> {
    /// Create a producer with the given period and event name.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError::ZeroPeriod`] for a zero period and
    /// [`ProducerError::InvalidEventName`] for an empty or multi-line name.
    pub fn new(period: Duration, event_name: impl Into<String>) -> Result<Self, ProducerError> {
        let event_name = event_name.into();
        if period.is_zero() {
            return Err(ProducerError::ZeroPeriod);
        }
        if event_name.is_empty() || event_name.contains(['\n', '\r']) {
            return Err(ProducerError::InvalidEventName(event_name));
        }
        Ok(Self {
            period,
            event_name,
            clock: SystemClock,
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The time stream: event `time` every second.
    pub fn time() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            event_name: TIME_EVENT.to_owned(),
            clock: SystemClock,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<C: Clock> StreamProducer<C> {
    /// Replace the clock used for payload timestamps.
    pub fn with_clock<D: Clock>(self, clock: D) -> StreamProducer<D> {
        StreamProducer {
            period: self.period,
            event_name: self.event_name,
            clock,
            active: self.active,
        }
    }

    /// Number of spawned connections whose task has not finished yet.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// The emission period.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// The name carried by every emitted event.
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Drive one connection until it is cancelled or the sink closes.
    ///
    /// The first event is emitted one full period after the call. Missed
    /// ticks (a slow sink) are skipped rather than replayed in a burst.
    /// Cancellation is raced against both the timer and every write, so a
    /// stalled reader cannot keep the task alive after the token fires.
    pub async fn run<S: EventSink>(&self, sink: &mut S, cancel: &CancellationToken) -> ProducerExit {
        let start = Instant::now()
            .checked_add(self.period)
            .unwrap_or_else(Instant::now);
        let mut ticker = tokio::time::interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return ProducerExit::Cancelled,
                _ = ticker.tick() => {}
            }

            let event = StreamEvent::new(self.event_name.as_str(), iso_timestamp(self.clock.now()));
            // A client that stops reading fills the channel; the write must
            // still yield to cancellation.
            tokio::select! {
                biased;
                () = cancel.cancelled() => return ProducerExit::Cancelled,
                sent = sink.send(event) => {
                    if sent.is_err() {
                        return ProducerExit::TransportClosed;
                    }
                }
            }
        }
    }
}

/// A running producer task bound to one connection.
///
/// Dropping the handle cancels the task; the timer is released as soon as
/// the task observes the cancellation.
#[derive(Debug)]
pub struct ProducerHandle {
    /// Identifier used in the connection's log lines.
    pub connection_id: ConnectionId,
    /// Events in emission order.
    pub events: mpsc::Receiver<StreamEvent>,
    /// The producer task; resolves with the exit reason.
    pub task: JoinHandle<ProducerExit>,
    guard: DropGuard,
}

impl ProducerHandle {
    /// Cancel the connection without waiting for the task.
    pub fn cancel(self) -> JoinHandle<ProducerExit> {
        drop(self.guard);
        self.task
    }

    /// Split into the event receiver and a guard that cancels the task
    /// when dropped. Used by transports that own the receiver.
    pub fn into_parts(self) -> (mpsc::Receiver<StreamEvent>, JoinHandle<ProducerExit>, DropGuard) {
        (self.events, self.task, self.guard)
    }
}

impl<C: Clock> StreamProducer<C> {
    /// Open a connection: spawn a producer task writing into a bounded
    /// channel of `capacity` events.
    ///
    /// `cancel` should be a child of the server's shutdown token; the
    /// handle holds a guard that cancels it on drop.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken, capacity: usize) -> ProducerHandle {
        let connection_id = ConnectionId::new();
        let (mut tx, events) = mpsc::channel(capacity.max(1));
        let producer = Arc::clone(self);
        let token = cancel.clone();
        let gauge = ActiveGuard::enter(Arc::clone(&self.active));

        let task = tokio::spawn(async move {
            let _gauge = gauge;
            info!(%connection_id, event = producer.event_name(), period_ms = producer.period().as_millis(), "Starting SSE time stream");
            let exit = producer.run(&mut tx, &token).await;
            info!(%connection_id, reason = exit.as_str(), "Closing SSE time stream");
            exit
        });

        debug!(%connection_id, "producer task spawned");

        ProducerHandle {
            connection_id,
            events,
            task,
            guard: cancel.drop_guard(),
        }
    }
}

/// Counts a connection as active from spawn until its task ends, on
/// every exit path.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
