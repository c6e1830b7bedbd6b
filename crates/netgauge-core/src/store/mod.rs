//! Sample store
//!
//! Owns the append-only series of samples for the session and mirrors it
//! to two redundant on-disk encodings after every append. The in-memory
//! series is authoritative; export failures are surfaced but never roll a
//! sample back.

mod export;

pub use export::{load_json, ExportPaths, ExportRecord};

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

use crate::sample::Sample;

/// Errors from the durable export path
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Writing or renaming an export file failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination export file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Reading an export file back failed
    #[error("failed to read {path}: {source}")]
    Read {
        /// Source export file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Encoding or decoding the structured export failed
    #[error("failed to encode series: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Append-only store of measurement samples
///
/// Shared between the runner's background worker (which appends) and the
/// presentation layer (which reads snapshots), typically behind an `Arc`.
pub struct SampleStore {
    /// The series, insertion order = chronological order
    series: Mutex<Vec<Sample>>,
    /// Destinations for the two export encodings
    paths: ExportPaths,
}

impl SampleStore {
    /// Create an empty store exporting to the given paths
    pub fn new(paths: ExportPaths) -> Self {
        Self {
            series: Mutex::new(Vec::new()),
            paths,
        }
    }

    fn series_lock(&self) -> MutexGuard<'_, Vec<Sample>> {
        // The series is left consistent across every unwind point
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a sample and rewrite both exports from the full series
    ///
    /// The in-memory append always takes effect. Both export files are then
    /// rewritten atomically (temp-then-rename); if either write fails the
    /// first error is returned after both have been attempted, and the
    /// sample stays in the series.
    pub fn append(&self, sample: Sample) -> Result<(), PersistenceError> {
        let snapshot = {
            let mut series = self.series_lock();
            series.push(sample);
            series.clone()
        };

        let csv_result = export::write_csv(&self.paths.csv, &snapshot);
        if let Err(e) = &csv_result {
            tracing::warn!("tabular export failed: {e}");
        }
        let json_result = export::write_json(&self.paths.json, &snapshot);
        if let Err(e) = &json_result {
            tracing::warn!("structured export failed: {e}");
        }

        csv_result.and(json_result)
    }

    /// Ordered copy of the current series
    pub fn snapshot(&self) -> Vec<Sample> {
        self.series_lock().clone()
    }

    /// Number of samples recorded this session
    pub fn len(&self) -> usize {
        self.series_lock().len()
    }

    /// Whether any sample has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.series_lock().is_empty()
    }

    /// The most recently appended sample, if any
    pub fn latest(&self) -> Option<Sample> {
        self.series_lock().last().cloned()
    }

    /// The export destinations this store writes to
    pub fn paths(&self) -> &ExportPaths {
        &self.paths
    }
}
