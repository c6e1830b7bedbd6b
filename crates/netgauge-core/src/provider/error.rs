//! Measurement errors

use thiserror::Error;

/// Errors that can occur while running a measurement pass
#[derive(Error, Debug)]
pub enum MeasurementError {
    /// Server discovery failed or returned nothing usable
    #[error("No measurement server available: {0}")]
    NoServer(String),

    /// A throughput or latency probe failed mid-run
    #[error("Probe failed: {0}")]
    Probe(String),

    /// The pass exceeded the configured time budget
    #[error("Measurement timed out")]
    Timeout,

    /// The background worker died before reporting a result
    #[error("Measurement worker failed: {0}")]
    Worker(String),
}
