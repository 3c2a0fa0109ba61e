//! Configuration parsing and validation.
//!
//! Loaded from a TOML file (default `./config/fls.toml`):
//!
//! ```toml
//! [server]
//! base_url = "http://127.0.0.1:8000"
//! submit_path = "/"
//! stream_path = "/search/async"
//!
//! [http]
//! connect_timeout_secs = 10
//!
//! [stream]
//! close_on_parse_error = false
//!
//! [display]
//! style = "random"
//! ```
//!
//! Only `[server].base_url` is required.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    #[serde(default = "default_submit_path")]
    pub submit_path: String,
    #[serde(default = "default_stream_path")]
    pub stream_path: String,
}

fn default_submit_path() -> String {
    "/".to_string()
}
fn default_stream_path() -> String {
    "/search/async".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("fls/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StreamConfig {
    /// Close the stream on the first undecodable frame instead of
    /// dropping it and carrying on.
    #[serde(default)]
    pub close_on_parse_error: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Badge style policy: `random` or `rotate`.
    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            style: default_style(),
        }
    }
}

fn default_style() -> String {
    "random".to_string()
}

impl Config {
    /// Defaults for commands that never talk to a server.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                submit_path: default_submit_path(),
                stream_path: default_stream_path(),
            },
            http: HttpConfig::default(),
            stream: StreamConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    /// Parsed `server.base_url`.
    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.server.base_url)
            .with_context(|| format!("Invalid server.base_url: '{}'", self.server.base_url))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a file that does not exist yields
/// [`Config::minimal`]. A file that exists and fails to read, parse or
/// validate is still an error.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::minimal());
    }
    load_config(path)
}

pub fn validate(config: &Config) -> Result<()> {
    let url = config.base_url()?;
    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!(
            "server.base_url must use http or https, got '{}'",
            other
        ),
    }

    for (name, path) in [
        ("server.submit_path", &config.server.submit_path),
        ("server.stream_path", &config.server.stream_path),
    ] {
        if !path.starts_with('/') {
            anyhow::bail!("{} must start with '/', got '{}'", name, path);
        }
    }

    if config.http.connect_timeout_secs == 0 {
        anyhow::bail!("http.connect_timeout_secs must be > 0");
    }

    match config.display.style.as_str() {
        "random" | "rotate" => {}
        other => anyhow::bail!(
            "Unknown display.style: '{}'. Must be random or rotate.",
            other
        ),
    }

    Ok(())
}
