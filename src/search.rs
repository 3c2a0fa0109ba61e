//! Search commands: submit, watch, and replay.
//!
//! Each command wires the pieces together for one job: a
//! [`SearchClient`] (or a captured body) as the frame source, a fresh
//! [`ResultAccumulator`], and the renderer for the chosen output mode.
//! Ctrl-C closes the channel and ends the run as cancelled.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use flight_stream_core::accumulate::{RandomStyle, ResultAccumulator, RotatingStyle, StylePolicy};
use flight_stream_core::models::{SearchJob, SearchRequest};
use flight_stream_core::render::{Renderer, StreamEnd};

use crate::config::Config;
use crate::pipeline::{run_stream_until, PipelineOptions, SearchOutcome};
use crate::render::RenderMode;
use crate::session::SearchClient;
use crate::transport::{FrameSource, ReplayFrameSource};

/// Submit `request` and stream its results.
pub async fn run_search(cfg: &Config, request: &SearchRequest, mode: RenderMode) -> Result<SearchOutcome> {
    let client = SearchClient::new(cfg)?;
    let job = client.submit(request).await?;
    if mode == RenderMode::Human {
        eprintln!("job {}", job);
    }
    stream_job(cfg, &client, &job, mode).await
}

/// Submit `request` and print the job id only.
pub async fn run_submit(cfg: &Config, request: &SearchRequest) -> Result<SearchJob> {
    let client = SearchClient::new(cfg)?;
    let job = client.submit(request).await?;
    println!("{}", job);
    Ok(job)
}

/// Stream results of an already submitted job.
pub async fn run_watch(cfg: &Config, job_id: &str, mode: RenderMode) -> Result<SearchOutcome> {
    let client = SearchClient::new(cfg)?;
    stream_job(cfg, &client, &SearchJob::new(job_id), mode).await
}

/// Run the pipeline over a captured text/event-stream body.
pub async fn run_replay(cfg: &Config, path: &Path, mode: RenderMode) -> Result<SearchOutcome> {
    let mut source = ReplayFrameSource::from_file(path)?;
    info!(path = %path.display(), frames = source.remaining(), "replaying capture");
    let job = SearchJob::new("replay");
    let mut renderer = mode.renderer();
    drive(cfg, &job, &mut source, renderer.as_mut()).await
}

async fn stream_job(
    cfg: &Config,
    client: &SearchClient,
    job: &SearchJob,
    mode: RenderMode,
) -> Result<SearchOutcome> {
    let mut renderer = mode.renderer();

    let mut source = match client.open_stream(job).await {
        Ok(source) => source,
        Err(e) => {
            warn!(job = %job, error = %e, "could not open result stream");
            renderer.on_error(&e.to_string());
            let end = StreamEnd::Failed(e);
            renderer.on_closed(&end);
            return Ok(SearchOutcome {
                end,
                frames: 0,
                records: 0,
                skipped_results: 0,
                dropped_frames: 0,
            });
        }
    };

    drive(cfg, job, &mut source, renderer.as_mut()).await
}

async fn drive<S>(
    cfg: &Config,
    job: &SearchJob,
    source: &mut S,
    renderer: &mut dyn Renderer,
) -> Result<SearchOutcome>
where
    S: FrameSource + ?Sized,
{
    let mut accumulator = ResultAccumulator::new(style_policy(cfg));
    let options = PipelineOptions::from(cfg);
    run_stream_until(job, source, &mut accumulator, renderer, &options, ctrl_c()).await
}

/// Badge style policy named by `display.style`.
pub fn style_policy(cfg: &Config) -> Box<dyn StylePolicy> {
    match cfg.display.style.as_str() {
        "rotate" => Box::new(RotatingStyle::default()),
        _ => Box::new(RandomStyle),
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available: never cancel
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_stream_core::accumulate::BadgeStyle;

    #[test]
    fn test_rotate_policy_is_deterministic() {
        let mut cfg = Config::minimal();
        cfg.display.style = "rotate".to_string();
        let mut policy = style_policy(&cfg);
        assert_eq!(policy.pick("a"), BadgeStyle::ALL[0]);
        assert_eq!(policy.pick("b"), BadgeStyle::ALL[1]);
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_an_error() {
        let cfg = Config::minimal();
        let err = run_replay(&cfg, Path::new("/nonexistent/capture.sse"), RenderMode::Json)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read stream capture"));
    }
}
