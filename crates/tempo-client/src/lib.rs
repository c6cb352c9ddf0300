//! Client Stream Consumer for the Tempo push stream.
//!
//! A [`Consumer`] subscribes to a named event on a `text/event-stream`
//! endpoint and keeps a [`LatestValue`] cell up to date. The cell starts
//! with a fallback value obtained through an ordinary request and is
//! never blanked: while the connection is down it keeps showing the last
//! payload it saw.
//!
//! # State machine
//!
//! ```text
//!              connect ok
//! Disconnected ----------> Connected
//!      |                    |  ^
//!      | connect err        |  | connect ok
//!      v       stream ends  v  |
//!  Reconnecting <---------------
//!      |
//!      | attempts exhausted
//!      v
//!  Exhausted            (any state) --close/drop--> Closed
//! ```
//!
//! Reconnect delays follow a bounded exponential [`Backoff`].

pub mod backoff;
pub mod config;
pub mod consumer;
pub mod error;
pub mod latest;
pub mod render;
pub mod state;
pub mod transport;

pub use backoff::Backoff;
pub use config::WatchConfig;
pub use consumer::{Consumer, ConsumerOptions, Subscription};
pub use error::{ClientError, TransportError};
pub use latest::LatestValue;
pub use state::ConnectionState;
pub use transport::{ByteStream, HttpTransport, Transport};
