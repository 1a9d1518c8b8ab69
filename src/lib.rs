//! # Bitpanda Price SDK
//!
//! Polls the public Bitpanda ticker on a fixed cadence and exposes the
//! selected symbols as price sensors for a host home-automation platform.
//!
//! The host injects two capabilities and never gets polled back:
//! a [`TickerFetcher`] (the HTTP seam, [`BitpandaFetcher`] being the stock
//! implementation) and an [`EntityPublisher`] (the entity write-back seam).
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use bitpanda_price_sdk::{setup_entry, BitpandaFetcher, EntityPublisher, TrackerConfig};
//!
//! struct LogPublisher;
//!
//! impl EntityPublisher for LogPublisher {
//!     fn write_state(&self, entity_id: &str) {
//!         println!("state changed: {entity_id}");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Arc::new(BitpandaFetcher::new()?);
//! let tracker = setup_entry(fetcher, Arc::new(LogPublisher), TrackerConfig::default()).await?;
//!
//! for sensor in tracker.sensors() {
//!     println!("{}: {:?} {}", sensor.symbol(), sensor.current_price(), sensor.unit());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! setup_entry(fetcher, publisher, config)
//!     ↓
//! UpdateCoordinator (primes once, then polls on the interval)
//!     ↓
//! TickerFetcher (one GET per cycle, 15s timeout)
//!     ↓
//! TickerSnapshot (atomic wholesale swap)
//!     ↓
//! PriceSensor per symbol → EntityPublisher::write_state
//! ```
//!
//! A failed cycle keeps the previous snapshot serving; only the priming
//! fetch may fail the caller. Sensor reads are synchronous lookups against
//! the current snapshot and never block on an in-flight fetch.

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod fetcher;
pub mod fetchers;
pub mod metrics;
pub mod sensor;
pub mod setup;
pub mod types;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use coordinator::{ListenerHandle, UpdateCoordinator};
pub use error::{ConfigError, CoordinatorError, SetupError, TickerError};
pub use fetcher::TickerFetcher;
pub use fetchers::BitpandaFetcher;
pub use metrics::FetchMetrics;
pub use sensor::{EntityPublisher, PriceSensor};
pub use setup::{setup_entry, PriceTracker};
pub use types::{
    CoordinatorState, Currency, SensorMetadata, SymbolPrice, TickerSnapshot, UpdateInterval,
};
