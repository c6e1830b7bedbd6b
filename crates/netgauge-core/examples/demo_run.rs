//! Demo-mode measurement run
//!
//! Drives the full pipeline (provider -> normalizer -> store -> events)
//! against the simulated provider and prints the result, without touching
//! the network.
//!
//! Usage:
//!   cargo run --example demo_run -- [OPTIONS]
//!
//! Options:
//!   --runs N          Number of measurements to take (default: 3)
//!   --seed N          Seed the simulated link for reproducible output
//!   --lookup          Also resolve the public address (hits the network)

use std::sync::Arc;
use std::time::Duration;

use netgauge_core::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let mut runs = 3usize;
    let mut seed: Option<u64> = None;
    let mut lookup = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                runs = args.get(i).and_then(|v| v.parse().ok()).unwrap_or(runs);
            }
            "--seed" => {
                i += 1;
                seed = args.get(i).and_then(|v| v.parse().ok());
            }
            "--lookup" => lookup = true,
            other => {
                eprintln!("Unknown option: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let provider = match seed {
        Some(seed) => DemoProvider::seeded(seed),
        None => DemoProvider::new(),
    }
    .with_probe_delay(Duration::from_millis(250));

    let export_dir = std::env::temp_dir().join("netgauge-demo");
    let store = Arc::new(SampleStore::new(ExportPaths::in_dir(&export_dir)));
    let config = RunnerConfig {
        timeout: Duration::from_secs(30),
        lookup_location: lookup,
    };
    let (runner, mut events) = MeasurementRunner::new(Arc::new(provider), store, config);

    println!("NetGauge demo run ({} measurements)", runs);
    println!("Exports: {}", export_dir.display());
    println!();

    for run in 1..=runs {
        runner.request_measurement();
        match events.recv().await {
            Some(MeasurementEvent::Completed {
                sample,
                location,
                persistence_warning,
            }) => {
                println!(
                    "[{}] {}  down {:.2} Mbps  up {:.2} Mbps  latency {} ms",
                    run,
                    sample.time_label(),
                    sample.download_mbps,
                    sample.upload_mbps,
                    sample.latency_ms
                );
                if let Some(info) = location {
                    println!("    location: {}", info.label());
                }
                if let Some(warning) = persistence_warning {
                    println!("    warning: {}", warning);
                }
            }
            Some(MeasurementEvent::Failed { reason }) => {
                println!("[{}] failed: {}", run, reason);
            }
            None => break,
        }
    }

    let series = runner.store().snapshot();
    println!();
    println!("Session series: {} samples", series.len());
}
