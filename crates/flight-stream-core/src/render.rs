//! Renderer contract.
//!
//! The pipeline never draws anything itself. After every batch it hands
//! the appended records and the touched provider summaries to a
//! [`Renderer`]; per-item failures and the final stream state are
//! reported the same way.

use crate::models::{DisplayRecord, ProviderSummary};
use crate::stream::StreamError;

/// How a result stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server signalled completion.
    Stopped,
    /// The body ended without a stop signal.
    Ended,
    /// The channel failed; no reconnect is attempted.
    Failed(StreamError),
    /// The host closed the channel (e.g. Ctrl-C).
    Cancelled,
}

impl StreamEnd {
    pub fn is_success(&self) -> bool {
        !matches!(self, StreamEnd::Failed(_))
    }
}

/// Presentation sink for the streaming pipeline.
pub trait Renderer: Send {
    /// Records appended by one batch, in arrival order. Never empty.
    fn on_records_appended(&mut self, records: &[DisplayRecord]);

    /// Current state of a provider summary after a batch touched it.
    fn on_provider_summary(&mut self, summary: &ProviderSummary);

    /// A non-fatal problem (dropped frame, skipped result) or the
    /// terminal stream error.
    fn on_error(&mut self, message: &str);

    /// The stream reached its terminal state.
    fn on_closed(&mut self, _end: &StreamEnd) {}
}

/// Discards everything.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn on_records_appended(&mut self, _records: &[DisplayRecord]) {}
    fn on_provider_summary(&mut self, _summary: &ProviderSummary) {}
    fn on_error(&mut self, _message: &str) {}
}
