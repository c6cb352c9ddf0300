//! Server-sent events transport for the time stream.
//!
//! Each `GET /sse/time` spawns one producer task writing into a bounded
//! channel. The response body owns the channel's receiver and the
//! connection's drop guard, so when the client goes away and Hyper drops
//! the body, the token is cancelled and the producer's timer is released.
//! Server shutdown reaches the same token through its parent.

use core::convert::Infallible;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::Stream;
use tempo_types::StreamEvent;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::DropGuard;
use tracing::debug;

use crate::state::AppState;

/// Events buffered per connection before the producer waits.
const STREAM_BUFFER: usize = 16;

/// Interval between keep-alive comments.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Handle `GET /sse/time`.
pub async fn sse_time(State(state): State<Arc<AppState>>) -> Sse<KeepAliveStream<ConnectionStream>> {
    let handle = state
        .producer
        .spawn(state.shutdown.child_token(), STREAM_BUFFER);
    debug!(connection_id = %handle.connection_id, "stream connection opened");

    let (events, _task, guard) = handle.into_parts();
    let stream = ConnectionStream {
        events: ReceiverStream::new(events),
        _guard: guard,
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

/// Body stream of one connection. Dropping it cancels the producer.
#[derive(Debug)]
pub struct ConnectionStream {
    events: ReceiverStream<StreamEvent>,
    _guard: DropGuard,
}

impl Stream for ConnectionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events)
            .poll_next(cx)
            .map(|event| event.map(|e| Ok(to_sse(&e))))
    }
}

/// `event: <name>` followed by `data: <payload>`.
fn to_sse(event: &StreamEvent) -> Event {
    Event::default().event(&event.name).data(&event.payload)
}
