//! Measurement runner
//!
//! Gates measurement requests to at most one in flight and executes each
//! run on a background task, so the presentation loop is never blocked.
//! Completion and failure are reported on an event channel; the shell can
//! additionally poll [`MeasurementRunner::state`] and read store snapshots.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::geo::{GeoClient, LocationInfo};
use crate::provider::{self, MeasurementError, MeasurementProvider};
use crate::sample::Sample;
use crate::store::SampleStore;

/// Runner state
///
/// A run that succeeds or fails returns the gate to `Idle`; the outcome
/// itself travels on the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No measurement in flight; a new request is accepted
    Idle,
    /// A measurement is in flight; further requests are ignored
    Running,
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on one full measurement pass
    pub timeout: Duration,
    /// Whether to resolve the public address after a successful run
    pub lookup_location: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            lookup_location: true,
        }
    }
}

/// Event delivered to the presentation layer, exactly one per run
#[derive(Debug)]
pub enum MeasurementEvent {
    /// The run finished and its sample was appended to the series
    Completed {
        /// The normalized measurement
        sample: Sample,
        /// Best-effort location of the public address; `None` when the
        /// lookup failed or was disabled
        location: Option<LocationInfo>,
        /// Present when the durable export failed; the sample is still in
        /// the in-memory series
        persistence_warning: Option<String>,
    },
    /// The run failed; nothing was created or stored
    Failed {
        /// Human-readable failure description
        reason: String,
    },
}

/// Gates and executes measurement runs
pub struct MeasurementRunner {
    provider: Arc<dyn MeasurementProvider>,
    store: Arc<SampleStore>,
    geo: Arc<GeoClient>,
    config: RunnerConfig,
    state: Arc<Mutex<RunState>>,
    events: UnboundedSender<MeasurementEvent>,
}

impl MeasurementRunner {
    /// Create a runner and the receiving end of its event channel
    pub fn new(
        provider: Arc<dyn MeasurementProvider>,
        store: Arc<SampleStore>,
        config: RunnerConfig,
    ) -> (Self, UnboundedReceiver<MeasurementEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let runner = Self {
            provider,
            store,
            geo: Arc::new(GeoClient::new()),
            config,
            state: Arc::new(Mutex::new(RunState::Idle)),
            events,
        };
        (runner, receiver)
    }

    /// Replace the geolocation client (custom endpoint, tests)
    pub fn with_geo_client(mut self, geo: GeoClient) -> Self {
        self.geo = Arc::new(geo);
        self
    }

    /// Current gate state
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The store this runner appends to
    pub fn store(&self) -> &Arc<SampleStore> {
        &self.store
    }

    /// Request a measurement run
    ///
    /// Returns `true` when a run was started. A request while a run is in
    /// flight is coalesced into it and returns `false`; requests are never
    /// queued. Must be called from within a tokio runtime.
    pub fn request_measurement(&self) -> bool {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == RunState::Running {
                tracing::debug!("measurement already in flight, request ignored");
                return false;
            }
            *state = RunState::Running;
        }

        let provider = Arc::clone(&self.provider);
        let store = Arc::clone(&self.store);
        let geo = Arc::clone(&self.geo);
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let events = self.events.clone();

        tokio::spawn(async move {
            let event = run_once(provider, store, geo, config).await;
            match &event {
                MeasurementEvent::Completed { sample, .. } => {
                    tracing::info!(
                        "measurement complete: {} / {} Mbps, {} ms",
                        sample.download_mbps,
                        sample.upload_mbps,
                        sample.latency_ms
                    );
                }
                MeasurementEvent::Failed { reason } => {
                    tracing::warn!("measurement failed: {reason}");
                }
            }
            // Reopen the gate before delivering the event so a shell
            // reacting to it can re-trigger at once
            *state.lock().unwrap_or_else(PoisonError::into_inner) = RunState::Idle;
            // Shell may have shut down; the run itself is still complete
            let _ = events.send(event);
        });

        true
    }
}

/// Execute one full run: probe, normalize, append, locate
async fn run_once(
    provider: Arc<dyn MeasurementProvider>,
    store: Arc<SampleStore>,
    geo: Arc<GeoClient>,
    config: RunnerConfig,
) -> MeasurementEvent {
    let mut worker =
        tokio::task::spawn_blocking(move || provider::run_measurement(provider.as_ref()));

    let raw = match tokio::time::timeout(config.timeout, &mut worker).await {
        Err(_) => {
            // The blocking probe cannot be interrupted; it finishes in the
            // background while the run reports Timeout
            worker.abort();
            return MeasurementEvent::Failed {
                reason: MeasurementError::Timeout.to_string(),
            };
        }
        Ok(Err(join_err)) => {
            return MeasurementEvent::Failed {
                reason: MeasurementError::Worker(join_err.to_string()).to_string(),
            };
        }
        Ok(Ok(Err(e))) => {
            return MeasurementEvent::Failed {
                reason: e.to_string(),
            };
        }
        Ok(Ok(Ok(raw))) => raw,
    };

    let sample = match Sample::from_raw(&raw) {
        Ok(sample) => sample,
        Err(e) => {
            return MeasurementEvent::Failed {
                reason: e.to_string(),
            };
        }
    };

    // Persistence failure is a warning, not a failed run
    let persistence_warning = match store.append(sample.clone()) {
        Ok(()) => None,
        Err(e) => Some(e.to_string()),
    };

    let location = if config.lookup_location {
        geo.lookup_current_location().await
    } else {
        None
    };

    MeasurementEvent::Completed {
        sample,
        location,
        persistence_warning,
    }
}
