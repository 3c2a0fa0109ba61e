//! Result stream: text/event-stream decoding and the stream state machine.
//!
//! [`SseDecoder`] turns raw body bytes into [`SseFrame`]s. [`ResultStream`]
//! turns frames into typed [`StreamEvent`]s and tracks the lifecycle of the
//! channel:
//!
//! ```text
//!          connect(job)        stop | error | end
//!   Idle ───────────────▶ Open ───────────────────▶ Closed
//!                         │  ▲
//!                         └──┘ message (Result | FrameError)
//! ```
//!
//! `Closed` is terminal. The terminal event is returned exactly once, so
//! the caller closes the underlying channel exactly once; anything
//! arriving afterwards is ignored.

use thiserror::Error;

use crate::models::ResultFrame;

/// Event name the server uses for result payloads (also the SSE default).
pub const EVENT_MESSAGE: &str = "message";
/// Event name signalling the end of the search.
pub const EVENT_STOP: &str = "stop";
/// Event name signalling an upstream failure.
pub const EVENT_ERROR: &str = "error";

/// Longest slice of a bad frame kept for diagnostics.
const RAW_EXCERPT_CHARS: usize = 200;

// ═══════════════════════════════════════════════════════════════════════
// Frame decoding
// ═══════════════════════════════════════════════════════════════════════

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    pub fn new(event: &str, data: &str) -> Self {
        Self {
            event: event.to_string(),
            data: data.to_string(),
            id: None,
        }
    }
}

/// Incremental text/event-stream decoder.
///
/// Feed it body chunks as they arrive; chunk boundaries may fall anywhere,
/// including inside a `\r\n` pair or a UTF-8 sequence. Lines end with
/// `\n`, `\r\n` or `\r`. A blank line dispatches the pending event; an
/// event left pending when the body ends is discarded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    /// Bytes of `buf` already searched for a line ending.
    scanned: usize,
    event: Option<String>,
    data: String,
    saw_data: bool,
    last_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every frame it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut i = self.scanned;
        while i < self.buf.len() {
            let b = self.buf[i];
            if b != b'\n' && b != b'\r' {
                i += 1;
                continue;
            }
            let mut next = i + 1;
            if b == b'\r' {
                // need the next byte to tell `\r` from `\r\n`
                if next == self.buf.len() {
                    break;
                }
                if self.buf[next] == b'\n' {
                    next += 1;
                }
            }
            let line = String::from_utf8_lossy(&self.buf[start..i]).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            start = next;
            i = next;
        }
        self.buf.drain(..start);
        self.scanned = i - start;
        frames
    }

    /// Signal end of body. A `\r` held back at the very end is taken as
    /// a line ending; an event still pending afterwards is discarded.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let frames = if self.buf.last() == Some(&b'\r') {
            self.feed(b"\n")
        } else {
            Vec::new()
        };
        *self = Self::default();
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(pos) => {
                let value = &line[pos + 1..];
                (&line[..pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.saw_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.saw_data = true;
            }
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    /// A named event dispatches even without data lines, so `event: stop`
    /// followed by a blank line is delivered.
    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if !self.saw_data && event.is_none() {
            return None;
        }
        self.saw_data = false;
        Some(SseFrame {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| EVENT_MESSAGE.to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_id.clone(),
        })
    }
}

/// Decode a complete captured body in one go.
pub fn decode_all(body: &[u8]) -> Vec<SseFrame> {
    let mut decoder = SseDecoder::new();
    let mut frames = decoder.feed(body);
    frames.extend(decoder.finish());
    frames
}

// ═══════════════════════════════════════════════════════════════════════
// State machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Open,
    Closed,
}

/// A `message` frame whose body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dropped malformed frame: {reason}")]
pub struct FrameParseError {
    pub reason: String,
    /// Leading excerpt of the offending body.
    pub raw: String,
}

/// Terminal channel failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("search backend reported an error: {0}")]
    Upstream(String),

    #[error("stream transport failed: {0}")]
    Transport(String),

    #[error("frame could not be parsed and the stream was configured to close: {0}")]
    Escalated(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot connect a stream that is {0:?}")]
pub struct InvalidTransition(pub StreamState);

/// Typed event produced from one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Result(ResultFrame),
    /// Non-terminal: the frame is dropped and the stream stays open.
    FrameError(FrameParseError),
    Stop,
    /// The body ended cleanly without a `stop` event.
    Ended,
    Error(StreamError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Stop | StreamEvent::Ended | StreamEvent::Error(_)
        )
    }
}

/// Lifecycle of one job's result channel.
#[derive(Debug)]
pub struct ResultStream {
    state: StreamState,
    job_id: Option<String>,
    frames_seen: u64,
}

impl Default for ResultStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStream {
    pub fn new() -> Self {
        Self {
            state: StreamState::Idle,
            job_id: None,
            frames_seen: 0,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Number of `message` frames handled while open.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// `Idle → Open`, binding the stream to `job_id`.
    pub fn connect(&mut self, job_id: &str) -> Result<(), InvalidTransition> {
        if self.state != StreamState::Idle {
            return Err(InvalidTransition(self.state));
        }
        self.job_id = Some(job_id.to_string());
        self.state = StreamState::Open;
        Ok(())
    }

    /// Route a decoded frame by event name. Unknown names are ignored.
    pub fn on_frame(&mut self, frame: &SseFrame) -> Option<StreamEvent> {
        match frame.event.as_str() {
            EVENT_MESSAGE => self.on_message(&frame.data),
            EVENT_STOP => self.on_stop(),
            EVENT_ERROR => self.on_error(StreamError::Upstream(frame.data.clone())),
            _ => None,
        }
    }

    /// `Open → Open`: parse a result payload.
    pub fn on_message(&mut self, data: &str) -> Option<StreamEvent> {
        if self.state != StreamState::Open {
            return None;
        }
        self.frames_seen += 1;

        let parsed = serde_json::from_str::<ResultFrame>(data)
            .map_err(|e| e.to_string())
            .and_then(|frame| {
                if frame.resource_id.is_empty() {
                    Err("resourceId is empty".to_string())
                } else {
                    Ok(frame)
                }
            });

        Some(match parsed {
            Ok(frame) => StreamEvent::Result(frame),
            Err(reason) => StreamEvent::FrameError(FrameParseError {
                reason,
                raw: data.chars().take(RAW_EXCERPT_CHARS).collect(),
            }),
        })
    }

    /// `Open → Closed` on the server's stop signal.
    pub fn on_stop(&mut self) -> Option<StreamEvent> {
        self.close_with(StreamEvent::Stop)
    }

    /// `Open → Closed` when the body ends without a stop signal. Servers
    /// that simply finish the response after their last result end here.
    pub fn on_end(&mut self) -> Option<StreamEvent> {
        self.close_with(StreamEvent::Ended)
    }

    /// `Open → Closed` on a channel failure.
    pub fn on_error(&mut self, err: StreamError) -> Option<StreamEvent> {
        self.close_with(StreamEvent::Error(err))
    }

    fn close_with(&mut self, event: StreamEvent) -> Option<StreamEvent> {
        if self.state != StreamState::Open {
            return None;
        }
        self.state = StreamState::Closed;
        Some(event)
    }
}
