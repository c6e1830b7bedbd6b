//! Measurement provider interface
//!
//! Abstracts the external speed-test capability behind a trait so the rest
//! of the pipeline depends on the result shape only. Providers are blocking
//! (a full pass takes seconds); the runner executes them off the foreground
//! loop.

mod demo;
mod error;

pub use demo::DemoProvider;
pub use error::MeasurementError;

use serde::{Deserialize, Serialize};

/// Identity of the measurement server selected for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Host address of the server, as reported by the provider
    pub host: String,
    /// Human-readable server name or sponsor
    pub name: String,
    /// Great-circle distance to the server in kilometers, if known
    pub distance_km: Option<f64>,
}

/// Raw output of one full measurement pass
///
/// Transient: consumed by [`Sample::from_raw`](crate::sample::Sample::from_raw)
/// immediately after the pass completes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResult {
    /// Measured download throughput in bytes per second
    pub download_bytes_per_sec: f64,
    /// Measured upload throughput in bytes per second
    pub upload_bytes_per_sec: f64,
    /// Round-trip latency to the selected server in milliseconds
    pub ping_ms: f64,
    /// The server the probes ran against
    pub server: ServerInfo,
}

/// External network-measurement capability
///
/// Each method may block for several seconds. Any step failing aborts the
/// pass with a [`MeasurementError`].
pub trait MeasurementProvider: Send + Sync {
    /// Pick the best available measurement server
    fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError>;

    /// Probe download throughput, in bytes per second
    fn measure_download(&self, server: &ServerInfo) -> Result<f64, MeasurementError>;

    /// Probe upload throughput, in bytes per second
    fn measure_upload(&self, server: &ServerInfo) -> Result<f64, MeasurementError>;

    /// Probe round-trip latency, in milliseconds
    fn measure_latency(&self, server: &ServerInfo) -> Result<f64, MeasurementError>;
}

/// Run the full measurement sequence against a provider
///
/// Discovery, download, upload, latency, in that order. Blocking; callers
/// on an async runtime should wrap this in `spawn_blocking`.
pub fn run_measurement(
    provider: &dyn MeasurementProvider,
) -> Result<MeasurementResult, MeasurementError> {
    let server = provider.discover_best_server()?;
    tracing::debug!("selected server {} ({})", server.host, server.name);

    let download_bytes_per_sec = provider.measure_download(&server)?;
    let upload_bytes_per_sec = provider.measure_upload(&server)?;
    let ping_ms = provider.measure_latency(&server)?;

    tracing::debug!(
        "measurement complete: down={:.0} B/s up={:.0} B/s ping={:.1}ms",
        download_bytes_per_sec,
        upload_bytes_per_sec,
        ping_ms
    );

    Ok(MeasurementResult {
        download_bytes_per_sec,
        upload_bytes_per_sec,
        ping_ms,
        server,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider;

    impl MeasurementProvider for StaticProvider {
        fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError> {
            Ok(ServerInfo {
                host: "test.example:8080".into(),
                name: "Test".into(),
                distance_km: None,
            })
        }

        fn measure_download(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            Ok(50_000_000.0)
        }

        fn measure_upload(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            Ok(10_000_000.0)
        }

        fn measure_latency(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            Ok(21.0)
        }
    }

    struct NoServerProvider;

    impl MeasurementProvider for NoServerProvider {
        fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError> {
            Err(MeasurementError::NoServer("no server found".into()))
        }

        fn measure_download(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            unreachable!("probe must not run without a server")
        }

        fn measure_upload(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            unreachable!("probe must not run without a server")
        }

        fn measure_latency(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
            unreachable!("probe must not run without a server")
        }
    }

    #[test]
    fn test_run_measurement_sequence() {
        let result = run_measurement(&StaticProvider).unwrap();
        assert_eq!(result.download_bytes_per_sec, 50_000_000.0);
        assert_eq!(result.upload_bytes_per_sec, 10_000_000.0);
        assert_eq!(result.ping_ms, 21.0);
        assert_eq!(result.server.host, "test.example:8080");
    }

    #[test]
    fn test_run_measurement_stops_at_discovery_failure() {
        let err = run_measurement(&NoServerProvider).unwrap_err();
        match err {
            MeasurementError::NoServer(reason) => assert_eq!(reason, "no server found"),
            other => panic!("Expected NoServer, got {:?}", other),
        }
    }
}
