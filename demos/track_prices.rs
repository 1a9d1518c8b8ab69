//! Tracks the default symbol set against the live Bitpanda ticker.
//!
//! Run with `cargo run --example track_prices`. Set `RUST_LOG=debug` to see
//! the fetch cycle.

use std::sync::Arc;
use std::time::Duration;

use bitpanda_price_sdk::{setup_entry, BitpandaFetcher, EntityPublisher, PriceTracker, TrackerConfig};

struct StdoutPublisher;

impl EntityPublisher for StdoutPublisher {
    fn write_state(&self, entity_id: &str) {
        println!("-> state write for {entity_id}");
    }
}

fn print_sensors(tracker: &PriceTracker) {
    for sensor in tracker.sensors() {
        let metadata = sensor.metadata();
        match sensor.current_price() {
            Some(price) => println!(
                "{}: {:.4} {} (next update {})",
                sensor.name(),
                price,
                sensor.unit(),
                metadata.next_update.to_rfc3339()
            ),
            None => println!("{}: unavailable", sensor.name()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let fetcher = Arc::new(BitpandaFetcher::new()?);
    let tracker = setup_entry(fetcher, Arc::new(StdoutPublisher), TrackerConfig::default()).await?;

    print_sensors(&tracker);

    tokio::time::sleep(Duration::from_secs(2)).await;
    tracker.coordinator().refresh_now().await?;
    print_sensors(&tracker);

    let metrics = tracker.coordinator().fetch_metrics();
    println!(
        "fetches: {} total, {} failed, p50 {:.0}ms",
        metrics.total_fetches, metrics.failed_fetches, metrics.latency_p50_ms
    );

    tracker.teardown();
    Ok(())
}
