//! Periodic push stream for the Tempo web template.
//!
//! This crate owns the server half of the push stream and the wire
//! decoding shared with the client half:
//!
//! - [`producer`] -- [`StreamProducer`], one cancellable interval task per
//!   connection, emitting a named event each period.
//! - [`sink`] -- [`EventSink`], the transport-facing side the producer
//!   writes into. A failed write ends the producer like a cancellation.
//! - [`clock`] -- [`Clock`] abstraction so payload timestamps can be
//!   pinned in tests.
//! - [`codec`] -- [`SseDecoder`], an incremental `text/event-stream`
//!   parser used by consumers.
//!
//! # Lifecycle
//!
//! ```text
//! open -> [ wait(tick | cancel) -> send ]* -> Cancelled | TransportClosed
//! ```
//!
//! The interval timer lives on the stack of [`StreamProducer::run`], so
//! it is released on every exit path.

pub mod clock;
pub mod codec;
pub mod producer;
pub mod sink;

pub use clock::{Clock, SteppingClock, SystemClock};
pub use codec::{Frame, SseDecoder};
pub use producer::{DEFAULT_PERIOD, ProducerError, ProducerExit, ProducerHandle, StreamProducer};
pub use sink::{EventSink, SinkClosed};
