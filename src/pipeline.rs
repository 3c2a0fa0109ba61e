//! Streaming pipeline orchestration.
//!
//! Drives one job's result stream end to end:
//! frame source → [`ResultStream`] → normalization → [`ResultAccumulator`]
//! → [`Renderer`].
//!
//! One frame is processed to completion before the next is awaited, so
//! the accumulator is never touched concurrently. Per-result failures and
//! undecodable frames are reported and skipped. A stop, the end of the
//! body, a channel error, or host cancellation ends the run. The channel is closed exactly once
//! and never reopened.

use anyhow::Result;
use std::future::Future;
use tracing::{debug, info, warn};

use flight_stream_core::accumulate::ResultAccumulator;
use flight_stream_core::models::SearchJob;
use flight_stream_core::normalize::normalize_batch;
use flight_stream_core::render::{Renderer, StreamEnd};
use flight_stream_core::stream::{ResultStream, StreamError, StreamEvent};

use crate::config::Config;
use crate::transport::FrameSource;

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Treat an undecodable frame as a channel failure.
    pub close_on_parse_error: bool,
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            close_on_parse_error: config.stream.close_on_parse_error,
        }
    }
}

/// Tally of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub end: StreamEnd,
    /// `message` frames received while open.
    pub frames: u64,
    /// Records appended to the accumulator by this run.
    pub records: usize,
    /// Provider results skipped (missing price, malformed).
    pub skipped_results: usize,
    /// Frames dropped because their body could not be decoded.
    pub dropped_frames: usize,
}

/// Run the pipeline until the stream stops or fails.
pub async fn run_stream<S>(
    job: &SearchJob,
    source: &mut S,
    accumulator: &mut ResultAccumulator,
    renderer: &mut dyn Renderer,
    options: &PipelineOptions,
) -> Result<SearchOutcome>
where
    S: FrameSource + ?Sized,
{
    run_stream_until(
        job,
        source,
        accumulator,
        renderer,
        options,
        std::future::pending::<()>(),
    )
    .await
}

/// Like [`run_stream`], but also ends (as [`StreamEnd::Cancelled`]) when
/// `cancel` completes.
pub async fn run_stream_until<S, F>(
    job: &SearchJob,
    source: &mut S,
    accumulator: &mut ResultAccumulator,
    renderer: &mut dyn Renderer,
    options: &PipelineOptions,
    cancel: F,
) -> Result<SearchOutcome>
where
    S: FrameSource + ?Sized,
    F: Future<Output = ()>,
{
    let mut stream = ResultStream::new();
    stream.connect(job.id())?;
    tokio::pin!(cancel);

    let mut records = 0usize;
    let mut skipped_results = 0usize;
    let mut dropped_frames = 0usize;

    let end = loop {
        let next = tokio::select! {
            next = source.next_frame() => Some(next),
            _ = &mut cancel => None,
        };

        let Some(next) = next else {
            info!(job = %job, "result stream cancelled");
            source.close().await;
            break StreamEnd::Cancelled;
        };

        let event = match next {
            Some(Ok(frame)) => {
                debug!(event = %frame.event, id = ?frame.id, bytes = frame.data.len(), "frame received");
                stream.on_frame(&frame)
            }
            Some(Err(err)) => stream.on_error(err),
            None => stream.on_end(),
        };
        let Some(event) = event else {
            continue;
        };
        if event.is_terminal() {
            source.close().await;
        }

        match event {
            StreamEvent::Result(frame) => {
                if frame.resource_id != job.id() {
                    debug!(job = %job, resource_id = %frame.resource_id, "frame resource id differs from job id");
                }
                let (batch, errors) = normalize_batch(&frame.resource_id, &frame.data);
                for err in &errors {
                    warn!(job = %job, error = %err, "skipping provider result");
                    renderer.on_error(&err.to_string());
                }
                skipped_results += errors.len();

                let update = accumulator.apply(batch);
                records += update.appended.len();
                if !update.appended.is_empty() {
                    renderer.on_records_appended(&update.appended);
                }
                for summary in &update.summaries {
                    renderer.on_provider_summary(summary);
                }
            }
            StreamEvent::FrameError(err) => {
                warn!(job = %job, error = %err, "dropping frame");
                dropped_frames += 1;
                renderer.on_error(&err.to_string());

                if options.close_on_parse_error {
                    if let Some(StreamEvent::Error(e)) =
                        stream.on_error(StreamError::Escalated(err.reason))
                    {
                        source.close().await;
                        renderer.on_error(&e.to_string());
                        break StreamEnd::Failed(e);
                    }
                }
            }
            StreamEvent::Stop => {
                info!(job = %job, records, "search finished");
                break StreamEnd::Stopped;
            }
            StreamEvent::Ended => {
                info!(job = %job, records, "result stream ended");
                break StreamEnd::Ended;
            }
            StreamEvent::Error(e) => {
                warn!(job = %job, error = %e, "result stream failed");
                renderer.on_error(&e.to_string());
                break StreamEnd::Failed(e);
            }
        }
    };

    renderer.on_closed(&end);

    Ok(SearchOutcome {
        end,
        frames: stream.frames_seen(),
        records,
        skipped_results,
        dropped_frames,
    })
}
