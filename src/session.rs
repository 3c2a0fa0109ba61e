//! Search submission and stream opening over HTTP.
//!
//! A search is one `POST` of the criteria, answered with an opaque job id,
//! followed by one long-lived `GET <stream_path>?id=<job>` carrying
//! text/event-stream frames for that job.
//!
//! Submission failures are surfaced as-is: the server's error body is kept
//! verbatim so it can be shown to the user untouched. Nothing here
//! retries; that is a caller decision.

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use flight_stream_core::models::{SearchJob, SearchRequest};
use flight_stream_core::stream::StreamError;

use crate::config::Config;
use crate::transport::HttpFrameSource;

/// Job creation failed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("search request rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("search submission failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search submission returned an empty job id")]
    EmptyJobId,
}

impl SubmissionError {
    /// The server's response body, untouched, when there was one.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            SubmissionError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// HTTP client bound to one search backend.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    submit_url: Url,
    stream_url: Url,
}

impl SearchClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.http.connect_timeout_secs))
            .user_agent(config.http.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            submit_url: endpoint(&config.server.base_url, &config.server.submit_path)?,
            stream_url: endpoint(&config.server.base_url, &config.server.stream_path)?,
        })
    }

    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// `<stream_path>?id=<job>`.
    pub fn stream_url(&self, job: &SearchJob) -> Url {
        let mut url = self.stream_url.clone();
        url.query_pairs_mut().append_pair("id", job.id());
        url
    }

    /// Submit the criteria and obtain a job id.
    pub async fn submit(&self, request: &SearchRequest) -> Result<SearchJob, SubmissionError> {
        debug!(url = %self.submit_url, routes = request.routes.len(), "submitting search");

        let response = self
            .http
            .post(self.submit_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let id = body.trim();
        if id.is_empty() {
            return Err(SubmissionError::EmptyJobId);
        }

        info!(job = id, "search submitted");
        Ok(SearchJob::new(id))
    }

    /// Open the push channel for `job`.
    pub async fn open_stream(&self, job: &SearchJob) -> Result<HttpFrameSource, StreamError> {
        let url = self.stream_url(job);
        debug!(%url, "opening result stream");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        info!(job = %job, "result stream open");
        Ok(HttpFrameSource::new(response))
    }
}

fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).with_context(|| format!("Invalid endpoint URL: '{}'", joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> SearchClient {
        let mut cfg = Config::minimal();
        cfg.server.base_url = base.to_string();
        SearchClient::new(&cfg).unwrap()
    }

    #[test]
    fn test_stream_url_carries_job_id() {
        let c = client("http://localhost:8000");
        let url = c.stream_url(&SearchJob::new("abc123"));
        assert_eq!(url.as_str(), "http://localhost:8000/search/async?id=abc123");
    }

    #[test]
    fn test_stream_url_escapes_job_id() {
        let c = client("http://localhost:8000/");
        let url = c.stream_url(&SearchJob::new("gAN+/Q=="));
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/search/async?id=gAN%2B%2FQ%3D%3D"
        );
    }

    #[test]
    fn test_base_path_prefix_is_kept() {
        let c = client("https://example.com/flights/");
        assert_eq!(c.submit_url().as_str(), "https://example.com/flights/");
        assert_eq!(
            c.stream_url(&SearchJob::new("j")).as_str(),
            "https://example.com/flights/search/async?id=j"
        );
    }

    #[test]
    fn test_raw_body_only_for_rejections() {
        let err = SubmissionError::Rejected {
            status: 400,
            body: "<ul><li>bad date</li></ul>".to_string(),
        };
        assert_eq!(err.raw_body(), Some("<ul><li>bad date</li></ul>"));
        assert!(SubmissionError::EmptyJobId.raw_body().is_none());
    }
}
