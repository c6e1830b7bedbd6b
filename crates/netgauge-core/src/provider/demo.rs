//! Demo Mode - Simulated network link for testing
//!
//! Generates plausible throughput and latency figures for UI testing
//! without touching the network. Simulates a mid-range residential
//! connection with per-probe jitter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

use super::{MeasurementError, MeasurementProvider, ServerInfo};

/// Relative jitter applied to throughput probes
const THROUGHPUT_JITTER: f64 = 0.08;
/// Relative jitter applied to latency probes
const LATENCY_JITTER: f64 = 0.25;

/// Simulated measurement provider
///
/// Default rates approximate a 100/20 Mbps residential line. Each probe
/// sleeps for a configurable delay so the runner's gating and progress
/// reporting behave as they would against a real provider.
pub struct DemoProvider {
    /// Nominal download rate in megabits per second
    download_mbps: f64,
    /// Nominal upload rate in megabits per second
    upload_mbps: f64,
    /// Nominal round-trip latency in milliseconds
    ping_ms: f64,
    /// Artificial per-probe delay
    probe_delay: Duration,
    /// Random number generator (probes take `&self`)
    rng: Mutex<StdRng>,
}

impl DemoProvider {
    /// Create a demo provider with entropy-seeded jitter
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a demo provider with deterministic jitter
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            download_mbps: 94.0,
            upload_mbps: 18.5,
            ping_ms: 23.0,
            probe_delay: Duration::from_millis(400),
            rng: Mutex::new(rng),
        }
    }

    /// Override the nominal link rates
    pub fn with_rates(mut self, download_mbps: f64, upload_mbps: f64, ping_ms: f64) -> Self {
        self.download_mbps = download_mbps;
        self.upload_mbps = upload_mbps;
        self.ping_ms = ping_ms;
        self
    }

    /// Override the artificial per-probe delay (zero for fast tests)
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    fn jitter(&self, nominal: f64, spread: f64) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        nominal * rng.gen_range(1.0 - spread..1.0 + spread)
    }

    fn simulate_probe(&self) {
        if !self.probe_delay.is_zero() {
            std::thread::sleep(self.probe_delay);
        }
    }
}

impl Default for DemoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementProvider for DemoProvider {
    fn discover_best_server(&self) -> Result<ServerInfo, MeasurementError> {
        self.simulate_probe();
        Ok(ServerInfo {
            host: "speedtest.demo.netgauge.dev:8080".to_string(),
            name: "NetGauge Demo Exchange".to_string(),
            distance_km: Some(12.4),
        })
    }

    fn measure_download(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
        self.simulate_probe();
        Ok(self.jitter(self.download_mbps, THROUGHPUT_JITTER) * 1_000_000.0)
    }

    fn measure_upload(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
        self.simulate_probe();
        Ok(self.jitter(self.upload_mbps, THROUGHPUT_JITTER) * 1_000_000.0)
    }

    fn measure_latency(&self, _server: &ServerInfo) -> Result<f64, MeasurementError> {
        self.simulate_probe();
        Ok(self.jitter(self.ping_ms, LATENCY_JITTER).max(1.0))
    }
}
