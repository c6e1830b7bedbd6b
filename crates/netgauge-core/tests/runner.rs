use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use netgauge_core::provider::{
    DemoProvider, MeasurementError, MeasurementProvider, ServerInfo,
};
use netgauge_core::runner::{MeasurementEvent, MeasurementRunner, RunState, RunnerConfig};
use netgauge_core::store::{ExportPaths, SampleStore};
use tempfile::TempDir;

/// Provider that counts invocations and holds the run open for a while
struct CountingProvider {
    discover_calls: AtomicUsize,
    probe_delay: Duration,
}

impl CountingProvider {
    fn new(probe_delay: Duration) -> Self {
        Self {
            discover_calls: AtomicUsize::new(0),
            probe_delay,
        }
    }

    fn server() -> ServerInfo {
        ServerInfo {
            host: "speedtest.example.net:8080".into(),
            name: "Example ISP".into(),
            distance_km: None,
        }
    }
}

impl MeasurementProvider for CountingProvider {
    fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.probe_delay);
        Ok(Self::server())
    }

    fn measure_download(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        Ok(100_000_000.0)
    }

    fn measure_upload(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        Ok(20_000_000.0)
    }

    fn measure_latency(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        Ok(15.0)
    }
}

struct NoServerProvider;

impl MeasurementProvider for NoServerProvider {
    fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError> {
        Err(MeasurementError::NoServer("no server found".into()))
    }

    fn measure_download(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        unreachable!()
    }

    fn measure_upload(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        unreachable!()
    }

    fn measure_latency(&self, _: &ServerInfo) -> Result<f64, MeasurementError> {
        unreachable!()
    }
}

fn test_config() -> RunnerConfig {
    RunnerConfig {
        timeout: Duration::from_secs(10),
        lookup_location: false,
    }
}

fn test_store(dir: &TempDir) -> Arc<SampleStore> {
    Arc::new(SampleStore::new(ExportPaths::in_dir(dir.path())))
}

#[tokio::test]
async fn test_requests_while_running_are_coalesced() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(CountingProvider::new(Duration::from_millis(200)));
    let (runner, mut events) =
        MeasurementRunner::new(Arc::clone(&provider) as _, test_store(&dir), test_config());

    assert!(runner.request_measurement());
    assert_eq!(runner.state(), RunState::Running);
    // Both of these land while the first run is still probing
    assert!(!runner.request_measurement());
    assert!(!runner.request_measurement());

    match events.recv().await.unwrap() {
        MeasurementEvent::Completed { sample, .. } => {
            assert_eq!(sample.download_mbps, 100.0);
            assert_eq!(sample.upload_mbps, 20.0);
            assert_eq!(sample.latency_ms, 15);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }

    // Exactly one background measurement executed, one sample stored,
    // no queued follow-up event
    assert_eq!(provider.discover_calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.store().snapshot().len(), 1);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_failed_measurement_appends_nothing() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    let (runner, mut events) =
        MeasurementRunner::new(Arc::new(NoServerProvider), Arc::clone(&store), test_config());

    let before = store.snapshot().len();
    assert!(runner.request_measurement());

    match events.recv().await.unwrap() {
        MeasurementEvent::Failed { reason } => {
            assert!(reason.contains("no server found"), "{reason}");
        }
        other => panic!("Expected Failed, got {:?}", other),
    }

    assert_eq!(store.snapshot().len(), before);
    assert_eq!(runner.state(), RunState::Idle);
}

#[tokio::test]
async fn test_runner_accepts_new_request_after_failure() {
    let dir = TempDir::new().unwrap();
    let (runner, mut events) =
        MeasurementRunner::new(Arc::new(NoServerProvider), test_store(&dir), test_config());

    assert!(runner.request_measurement());
    assert!(matches!(
        events.recv().await.unwrap(),
        MeasurementEvent::Failed { .. }
    ));

    assert!(runner.request_measurement());
    assert!(matches!(
        events.recv().await.unwrap(),
        MeasurementEvent::Failed { .. }
    ));
}

#[tokio::test]
async fn test_persistence_failure_still_reports_success() {
    let dir = TempDir::new().unwrap();
    // Export directory path points at a regular file; every write fails
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let store = Arc::new(SampleStore::new(ExportPaths::in_dir(&blocker)));

    let provider = Arc::new(CountingProvider::new(Duration::ZERO));
    let (runner, mut events) =
        MeasurementRunner::new(provider as _, Arc::clone(&store), test_config());

    assert!(runner.request_measurement());
    match events.recv().await.unwrap() {
        MeasurementEvent::Completed {
            persistence_warning,
            ..
        } => {
            let warning = persistence_warning.expect("expected a persistence warning");
            assert!(warning.contains("failed to write"), "{warning}");
        }
        other => panic!("Expected Completed, got {:?}", other),
    }

    // The in-memory series grew despite the failed exports
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_slow_measurement_times_out() {
    let dir = TempDir::new().unwrap();
    // Runtime shutdown waits for the abandoned blocking probe, so keep it short
    let provider = Arc::new(CountingProvider::new(Duration::from_millis(400)));
    let config = RunnerConfig {
        timeout: Duration::from_millis(50),
        lookup_location: false,
    };
    let (runner, mut events) =
        MeasurementRunner::new(provider as _, test_store(&dir), config);

    assert!(runner.request_measurement());
    match events.recv().await.unwrap() {
        MeasurementEvent::Failed { reason } => {
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("Expected Failed, got {:?}", other),
    }

    assert_eq!(runner.state(), RunState::Idle);
    assert!(runner.store().is_empty());
}

#[tokio::test]
async fn test_demo_provider_end_to_end() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(DemoProvider::seeded(99).with_probe_delay(Duration::ZERO));
    let store = test_store(&dir);
    let (runner, mut events) =
        MeasurementRunner::new(provider, Arc::clone(&store), test_config());

    for expected_len in 1..=3 {
        assert!(runner.request_measurement());
        match events.recv().await.unwrap() {
            MeasurementEvent::Completed {
                sample,
                location,
                persistence_warning,
            } => {
                assert!(sample.download_mbps > 0.0);
                assert!(location.is_none());
                assert!(persistence_warning.is_none());
            }
            other => panic!("Expected Completed, got {:?}", other),
        }
        assert_eq!(store.snapshot().len(), expected_len);
    }
}
