//! Frame sources: where the pipeline pulls server-sent events from.
//!
//! - **[`HttpFrameSource`]**: a live text/event-stream response body,
//!   decoded incrementally as chunks arrive.
//! - **[`ReplayFrameSource`]**: frames decoded from a captured body
//!   (`fls replay`, tests).
//!
//! A source yields `None` once the body is exhausted. It does not decide
//! what that means; the stream state machine does.

use anyhow::Context;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use tracing::debug;

use flight_stream_core::stream::{decode_all, SseDecoder, SseFrame, StreamError};

/// A pull-based source of server-sent events.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame. `None` means the body ended.
    async fn next_frame(&mut self) -> Option<Result<SseFrame, StreamError>>;

    /// Release the underlying channel. Later calls to
    /// [`next_frame`](FrameSource::next_frame) return `None`.
    async fn close(&mut self);
}

/// Live SSE response body.
pub struct HttpFrameSource {
    body: Option<reqwest::Response>,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
}

impl HttpFrameSource {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            body: Some(response),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }
}

#[async_trait]
impl FrameSource for HttpFrameSource {
    async fn next_frame(&mut self) -> Option<Result<SseFrame, StreamError>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(Ok(frame));
            }
            let body = self.body.as_mut()?;
            match body.chunk().await {
                Ok(Some(chunk)) => {
                    debug!(bytes = chunk.len(), "stream chunk");
                    self.pending.extend(self.decoder.feed(&chunk));
                }
                Ok(None) => {
                    self.body = None;
                    self.pending.extend(self.decoder.finish());
                }
                Err(e) => {
                    self.body = None;
                    return Some(Err(StreamError::Transport(e.to_string())));
                }
            }
        }
    }

    async fn close(&mut self) {
        // dropping the response closes the connection
        self.body = None;
        self.pending.clear();
        self.decoder = SseDecoder::new();
    }
}

/// Pre-decoded frames, served in order.
#[derive(Debug, Default)]
pub struct ReplayFrameSource {
    frames: VecDeque<SseFrame>,
    closes: usize,
}

impl ReplayFrameSource {
    pub fn new(frames: Vec<SseFrame>) -> Self {
        Self {
            frames: frames.into(),
            closes: 0,
        }
    }

    /// Decode a captured text/event-stream body.
    pub fn from_bytes(body: &[u8]) -> Self {
        Self::new(decode_all(body))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let body = std::fs::read(path)
            .with_context(|| format!("Failed to read stream capture: {}", path.display()))?;
        Ok(Self::from_bytes(&body))
    }

    /// How many times [`close`](FrameSource::close) was called.
    pub fn close_count(&self) -> usize {
        self.closes
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl FrameSource for ReplayFrameSource {
    async fn next_frame(&mut self) -> Option<Result<SseFrame, StreamError>> {
        self.frames.pop_front().map(Ok)
    }

    async fn close(&mut self) {
        self.closes += 1;
        self.frames.clear();
    }
}
