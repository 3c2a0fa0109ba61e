//! # Flight Stream CLI (`fls`)
//!
//! ## Usage
//!
//! ```bash
//! fls --config ./config/fls.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fls search` | Submit criteria and stream results as providers answer |
//! | `fls submit` | Submit criteria and print the job id |
//! | `fls watch <job-id>` | Stream results of an existing job |
//! | `fls replay <file>` | Run the pipeline over a captured event stream |
//!
//! ## Examples
//!
//! ```bash
//! # One-way, two adults, business
//! fls search --route ATH:LHR:2024-06-01 --adults 2 --cabin-class C
//!
//! # Round trip, JSON lines for scripts
//! fls search --route ATH:LHR:2024-06-01 --route LHR:ATH:2024-06-08 --output json
//!
//! # Criteria from a file
//! fls search --request ./request.json
//! ```
//!
//! Exit status is 1 when the submission is rejected or the stream fails.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use flight_stream::config::{self, Config};
use flight_stream::criteria::{self, CriteriaArgs};
use flight_stream::pipeline::SearchOutcome;
use flight_stream::render::RenderMode;
use flight_stream::search;
use flight_stream::session::SubmissionError;

/// Flight Stream CLI: submit a flight search and watch provider results
/// arrive as they are found.
#[derive(Parser)]
#[command(
    name = "fls",
    about = "Streaming multi-provider flight search client",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/fls.toml`. See `config/fls.example.toml`.
    #[arg(long, global = true, default_value = "./config/fls.toml")]
    config: PathBuf,

    /// Override `server.base_url` from the config file.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a search and stream its results.
    Search {
        #[command(flatten)]
        criteria: CriteriaOpts,

        /// Output format: `human` or `json`. Defaults to human on a TTY.
        #[arg(long)]
        output: Option<String>,
    },

    /// Submit a search and print the job id.
    Submit {
        #[command(flatten)]
        criteria: CriteriaOpts,
    },

    /// Stream results of an already submitted job.
    Watch {
        /// Job id returned by `fls submit`.
        job_id: String,

        #[arg(long)]
        output: Option<String>,
    },

    /// Run the pipeline over a captured text/event-stream body. No server
    /// is contacted.
    Replay {
        /// Capture file.
        file: PathBuf,

        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Args)]
struct CriteriaOpts {
    /// Route as FROM:TO:DATETIME (or FROM:TO:DATE). Repeat for multi-leg trips.
    #[arg(long = "route")]
    routes: Vec<String>,

    #[arg(long, default_value_t = 1)]
    adults: u32,

    #[arg(long, default_value_t = 0)]
    children: u32,

    #[arg(long, default_value_t = 0)]
    infants: u32,

    #[arg(long, default_value = "Y")]
    cabin_class: String,

    /// Restrict to one carrier (IATA code).
    #[arg(long, default_value = "")]
    carrier: String,

    #[arg(long, default_value = "EUR")]
    currency: String,

    #[arg(long, default_value = "en_US")]
    locale: String,

    #[arg(long, default_value = "us")]
    market: String,

    /// Direct routes only.
    #[arg(long)]
    direct: bool,

    #[arg(long)]
    flexible_dates: bool,

    /// Read the whole request from a JSON file instead.
    #[arg(long, conflicts_with = "routes")]
    request: Option<PathBuf>,
}

impl CriteriaOpts {
    fn into_request(self) -> anyhow::Result<flight_stream_core::models::SearchRequest> {
        if let Some(path) = &self.request {
            return criteria::load_request(path);
        }
        criteria::build_request(&CriteriaArgs {
            routes: self.routes,
            adults: self.adults,
            children: self.children,
            infants: self.infants,
            cabin_class: self.cabin_class,
            carrier: self.carrier,
            currency: self.currency,
            locale: self.locale,
            market: self.market,
            direct: self.direct,
            flexible_dates: self.flexible_dates,
        })
    }
}

fn render_mode(output: Option<&str>) -> anyhow::Result<RenderMode> {
    match output {
        None => Ok(RenderMode::default_for_tty()),
        Some(s) => RenderMode::parse(s)
            .ok_or_else(|| anyhow::anyhow!("Unknown output format: '{}'. Use human or json.", s)),
    }
}

fn load(cli: &Cli, allow_missing: bool) -> anyhow::Result<Config> {
    let mut cfg = if allow_missing {
        config::load_or_minimal(&cli.config)?
    } else {
        config::load_config(&cli.config)?
    };
    if let Some(base_url) = &cli.base_url {
        cfg.server.base_url = base_url.clone();
        config::validate(&cfg)?;
    }
    Ok(cfg)
}

fn finish(outcome: SearchOutcome) {
    if !outcome.end.is_success() {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Without a config file, --base-url alone is enough to reach a server
    let allow_missing = cli.base_url.is_some() || matches!(cli.command, Commands::Replay { .. });
    let cfg = load(&cli, allow_missing)?;

    let result = match cli.command {
        Commands::Search { criteria, output } => {
            let mode = render_mode(output.as_deref())?;
            let request = criteria.into_request()?;
            search::run_search(&cfg, &request, mode).await.map(finish)
        }
        Commands::Submit { criteria } => {
            let request = criteria.into_request()?;
            search::run_submit(&cfg, &request).await.map(|_| ())
        }
        Commands::Watch { job_id, output } => {
            let mode = render_mode(output.as_deref())?;
            search::run_watch(&cfg, &job_id, mode).await.map(finish)
        }
        Commands::Replay { file, output } => {
            let mode = render_mode(output.as_deref())?;
            search::run_replay(&cfg, &file, mode).await.map(finish)
        }
    };

    if let Err(err) = result {
        if let Some(submission) = err.downcast_ref::<SubmissionError>() {
            match submission.raw_body() {
                // the backend's own error body, shown untouched
                Some(body) => eprintln!("{}", body),
                None => eprintln!("Error: {}", submission),
            }
            std::process::exit(1);
        }
        return Err(err);
    }

    Ok(())
}
