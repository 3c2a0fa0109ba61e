//! # Flight Stream
//!
//! Streaming client for a multi-provider flight search backend.
//!
//! A search is submitted once and answered with a job id. Providers then
//! push their results over a server-sent event channel as they finish;
//! each frame is decoded, normalized into display records, and appended
//! to a running view that is rendered incrementally.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  POST   ┌──────────┐   SSE    ┌────────────┐   ┌───────────┐
//! │ criteria │───────▶│ session  │────────▶│  pipeline   │──▶│ renderer  │
//! └──────────┘  job id └──────────┘  frames  │ normalize + │   │ human/json│
//!                                            │ accumulate  │   └───────────┘
//!                                            └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! fls search --route ATH:SKG:2024-06-01   # submit and stream
//! fls submit --route ATH:SKG:2024-06-01   # print the job id only
//! fls watch <job-id>                      # stream an existing job
//! fls replay capture.sse                  # offline, from a captured body
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`criteria`] | Search criteria from CLI arguments or a JSON file |
//! | [`session`] | Submission and stream opening over HTTP |
//! | [`transport`] | Frame sources (live HTTP, replay) |
//! | [`pipeline`] | Stream → normalize → accumulate → render |
//! | [`render`] | Terminal and JSON renderers |
//! | [`search`] | CLI command implementations |
//!
//! Parsing, resolution, normalization and accumulation live in the
//! `flight-stream-core` crate and have no I/O.

pub mod config;
pub mod criteria;
pub mod pipeline;
pub mod render;
pub mod search;
pub mod session;
pub mod transport;
