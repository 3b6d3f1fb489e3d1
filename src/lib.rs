//! Pulselink — serial heart-rate telemetry conditioning.
//!
//! Ingests noisy line-delimited telemetry (`rate;break`) from one or more
//! serial devices shared across multiple players, conditions it into a
//! stable smoothed per-player signal, and exposes derived statistics
//! through a read-only query surface cheap enough to poll every frame.
//!
//! ```text
//!   bytes ─▶ framing ─▶ protocol ─▶ filter ─▶ player ─▶ queries
//!                       (readers drive the pipeline, the registry
//!                        drives the readers once per tick)
//! ```

#![deny(unused_must_use)]

pub mod config;
pub mod filter;
pub mod framing;
pub mod player;
pub mod protocol;
pub mod readers;
pub mod registry;

mod error;

pub use config::{TelemetryConfig, FAKE_PORT_NAME};
pub use error::{Error, Result};
pub use registry::Registry;
