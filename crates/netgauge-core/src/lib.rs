//! # NetGauge Core Library
//!
//! Core functionality for the NetGauge internet speed monitor.

#![warn(missing_docs)]

//!
//! This library provides:
//! - The measurement provider interface (server discovery, throughput and
//!   latency probes) plus a simulated provider for demo mode
//! - Normalization of raw probe output into `Sample` records
//! - The append-only sample store with CSV and JSON exports
//! - The measurement runner that gates concurrent requests and reports
//!   completion events to the presentation layer
//! - Best-effort geolocation of the public address
//!
//! The GUI shell is a separate application; it drives the runner, listens
//! on its event channel, and reads store snapshots for chart rendering.
//!
//! ## Example
//!
//! ```rust,ignore
//! use netgauge_core::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(SampleStore::new(ExportPaths::default_paths()));
//! let provider = Arc::new(DemoProvider::new());
//! let (runner, mut events) = MeasurementRunner::new(provider, store, RunnerConfig::default());
//!
//! runner.request_measurement();
//! if let Some(MeasurementEvent::Completed { sample, .. }) = events.recv().await {
//!     println!("{} Mbps down", sample.download_mbps);
//! }
//! ```

pub mod geo;
pub mod provider;
pub mod runner;
pub mod sample;
pub mod store;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::geo::{GeoClient, LocationInfo};
    pub use crate::provider::{
        DemoProvider, MeasurementError, MeasurementProvider, MeasurementResult, ServerInfo,
    };
    pub use crate::runner::{MeasurementEvent, MeasurementRunner, RunState, RunnerConfig};
    pub use crate::sample::{InvalidMeasurement, Sample};
    pub use crate::store::{ExportPaths, ExportRecord, PersistenceError, SampleStore};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
