//! # flight-stream core
//!
//! Transport-free logic for consuming a multi-provider flight search as a
//! stream of pushed result frames: data models, resource resolution,
//! itinerary normalization, the result-stream state machine with its
//! text/event-stream decoder, and the append-only result accumulator.
//!
//! This crate contains no tokio, reqwest, or filesystem I/O. The
//! `flight-stream` crate wires it to HTTP and the terminal.
//!
//! ```text
//!  SseDecoder ─▶ ResultStream ─▶ normalize (resolve) ─▶ ResultAccumulator ─▶ Renderer
//! ```

pub mod accumulate;
pub mod models;
pub mod normalize;
pub mod render;
pub mod resolve;
pub mod stream;
