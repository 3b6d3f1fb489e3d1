//! Crate-wide error types.
//!
//! Most faults in this pipeline are recovered locally (malformed lines are
//! skipped, an unopenable port degrades to a permanently-closed reader), so
//! the variants here cover only what callers can actually act on: invalid
//! configuration, the single-instance guard, and read-step I/O faults that
//! the registry logs and isolates per reader.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A registry is already live in this process. The existing instance
    /// remains authoritative; drop it before creating another.
    #[error("a telemetry registry is already running in this process")]
    RegistryAlreadyRunning,

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// Opening a serial device failed. Surfaced only in logs at open time;
    /// the reader is then created permanently closed.
    #[error("could not open port {port}: {source}")]
    PortOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// An unexpected I/O fault while draining a source mid-poll. Caught by
    /// the registry, logged, and the reader gets another chance next tick.
    #[error("read fault on {port}: {source}")]
    PortRead {
        port: String,
        #[source]
        source: std::io::Error,
    },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, Error>;
