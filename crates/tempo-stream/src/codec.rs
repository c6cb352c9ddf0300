//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::push`] buffers partial
//! lines and yields a [`Frame`] for every completed event. The parser
//! follows the event-stream format:
//!
//! ```text
//! : comment          -> ignored (keep-alives)
//! event: time        -> name of the pending event
//! data: 2024-...Z    -> appended to the pending payload
//! id: 42             -> remembered as the last event id
//! retry: 3000        -> reconnection delay hint
//! <blank line>       -> dispatch the pending event
//! ```
//!
//! A frame without `data:` lines is discarded on dispatch. Frames without
//! an `event:` line are named [`DEFAULT_EVENT`].
//!
//! A line or frame longer than [`MAX_PENDING`] bytes is never completed:
//! the decoder drops its partial state and reports [`Frame::Overflow`].

use std::time::Duration;

use bytes::BytesMut;
use tempo_types::{DEFAULT_EVENT, StreamEvent};

/// Most bytes held for an unfinished line or an undispatched payload.
pub const MAX_PENDING: usize = 64 * 1024;

/// A decoded unit of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete named event.
    Event(StreamEvent),
    /// The server asked for a different reconnection delay.
    Retry(Duration),
    /// The upstream sent more than [`MAX_PENDING`] bytes without finishing
    /// a line or a frame. Partial state was dropped; the stream should be
    /// treated as lost.
    Overflow,
}

/// Stateful decoder for one connection.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: Option<String>,
    data: Option<String>,
    last_event_id: Option<String>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and collect the frames it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos.saturating_add(1));
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.process_line(text) {
                frames.push(frame);
            }
            if self.data.as_ref().is_some_and(|d| d.len() > MAX_PENDING) {
                self.reset();
                frames.push(Frame::Overflow);
                return frames;
            }
        }

        if self.buf.len() > MAX_PENDING {
            self.reset();
            frames.push(Frame::Overflow);
        }
        frames
    }

    /// The id of the last event seen, sent as `Last-Event-ID` on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Drop any partially received frame. Called when a connection breaks;
    /// the last event id survives.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.event = None;
        self.data = None;
    }

    fn process_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_owned()),
            },
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_owned()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    return Some(Frame::Retry(Duration::from_millis(ms)));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        let name = self.event.take();
        let payload = self.data.take()?;
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT.to_owned());
        Some(Frame::Event(StreamEvent::new(name, payload)))
    }
}
