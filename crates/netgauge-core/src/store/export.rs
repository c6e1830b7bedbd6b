//! Durable export formats
//!
//! Mirrors the in-memory series to a tabular CSV file and a structured
//! JSON file. Every write rewrites the whole file from the full series:
//! content goes to a temp file in the destination directory, then an
//! atomic rename replaces the previous version, so a crash mid-write
//! leaves at worst the prior export.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::PersistenceError;
use crate::sample::Sample;

/// CSV header, column order fixed
const CSV_HEADER: &str = "time,download,upload,latency";

/// Destination files for the two export encodings
#[derive(Debug, Clone)]
pub struct ExportPaths {
    /// Tabular export, one row per sample
    pub csv: PathBuf,
    /// Structured export, array of records
    pub json: PathBuf,
}

impl ExportPaths {
    /// Standard file names (`speed_results.csv` / `.json`) under a directory
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            csv: dir.join("speed_results.csv"),
            json: dir.join("speed_results.json"),
        }
    }

    /// Exports under the user data directory, falling back to the working
    /// directory when the platform reports none
    pub fn default_paths() -> Self {
        let dir = dirs::data_dir()
            .map(|d| d.join("netgauge"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(dir)
    }
}

/// On-disk shape of one sample, shared by both encodings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Completion time, `HH:MM:SS` local
    pub time: String,
    /// Download throughput in Mbps
    pub download: f64,
    /// Upload throughput in Mbps
    pub upload: f64,
    /// Round-trip latency in milliseconds
    pub latency: u32,
}

impl From<&Sample> for ExportRecord {
    fn from(sample: &Sample) -> Self {
        Self {
            time: sample.time_label(),
            download: sample.download_mbps,
            upload: sample.upload_mbps,
            latency: sample.latency_ms,
        }
    }
}

/// Rewrite the tabular export from the full series
pub(super) fn write_csv(path: &Path, series: &[Sample]) -> Result<(), PersistenceError> {
    let mut content = String::with_capacity(64 * (series.len() + 1));
    content.push_str(CSV_HEADER);
    content.push('\n');
    for sample in series {
        let record = ExportRecord::from(sample);
        content.push_str(&format!(
            "{},{},{},{}\n",
            record.time, record.download, record.upload, record.latency
        ));
    }
    replace_file(path, content.as_bytes())
}

/// Rewrite the structured export from the full series
pub(super) fn write_json(path: &Path, series: &[Sample]) -> Result<(), PersistenceError> {
    let records: Vec<ExportRecord> = series.iter().map(ExportRecord::from).collect();
    let content = serde_json::to_vec_pretty(&records)?;
    replace_file(path, &content)
}

/// Read a structured export back into records
pub fn load_json(path: &Path) -> Result<Vec<ExportRecord>, PersistenceError> {
    let content = fs::read(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&content)?)
}

/// Write `content` to a temp file next to `path`, then rename over it
fn replace_file(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let tmp = tmp_path(path);
    {
        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }

    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
