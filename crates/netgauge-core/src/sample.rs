//! Sample normalization
//!
//! Converts raw provider output into the canonical `Sample` record used by
//! the store and the presentation layer.

use chrono::{DateTime, Local, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::MeasurementResult;

/// Raw provider values the normalizer refused to accept
#[derive(Error, Debug)]
pub enum InvalidMeasurement {
    /// A throughput probe reported a negative rate
    #[error("negative throughput reading: {0} bytes/sec")]
    NegativeThroughput(f64),

    /// The latency probe reported a negative round-trip time
    #[error("negative latency reading: {0} ms")]
    NegativeLatency(f64),

    /// A probe reported NaN or infinity
    #[error("non-finite reading: {0}")]
    NonFinite(f64),
}

/// One normalized measurement observation
///
/// Immutable once created; the store never mutates appended samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock completion time, local, second precision
    pub timestamp: DateTime<Local>,
    /// Download throughput in megabits per second, rounded to 2 decimals
    pub download_mbps: f64,
    /// Upload throughput in megabits per second, rounded to 2 decimals
    pub upload_mbps: f64,
    /// Round-trip latency to the selected server in milliseconds
    pub latency_ms: u32,
}

impl Sample {
    /// Normalize a raw measurement into a sample stamped with the current time
    pub fn from_raw(raw: &MeasurementResult) -> Result<Self, InvalidMeasurement> {
        Self::from_raw_at(raw, Local::now())
    }

    /// Normalize a raw measurement with an explicit timestamp
    pub fn from_raw_at(
        raw: &MeasurementResult,
        timestamp: DateTime<Local>,
    ) -> Result<Self, InvalidMeasurement> {
        Ok(Self {
            timestamp: timestamp.trunc_subsecs(0),
            download_mbps: to_mbps(raw.download_bytes_per_sec)?,
            upload_mbps: to_mbps(raw.upload_bytes_per_sec)?,
            latency_ms: to_latency_ms(raw.ping_ms)?,
        })
    }

    /// Completion time formatted for display and exports (`HH:MM:SS`)
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Convert bytes/sec into Mbps rounded to 2 decimal places
fn to_mbps(bytes_per_sec: f64) -> Result<f64, InvalidMeasurement> {
    if !bytes_per_sec.is_finite() {
        return Err(InvalidMeasurement::NonFinite(bytes_per_sec));
    }
    if bytes_per_sec < 0.0 {
        return Err(InvalidMeasurement::NegativeThroughput(bytes_per_sec));
    }
    Ok((bytes_per_sec / 1_000_000.0 * 100.0).round() / 100.0)
}

/// Convert a ping reading into whole milliseconds
fn to_latency_ms(ping_ms: f64) -> Result<u32, InvalidMeasurement> {
    if !ping_ms.is_finite() {
        return Err(InvalidMeasurement::NonFinite(ping_ms));
    }
    if ping_ms < 0.0 {
        return Err(InvalidMeasurement::NegativeLatency(ping_ms));
    }
    Ok(ping_ms.round() as u32)
}
