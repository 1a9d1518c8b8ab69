//! Entry setup, reload and teardown
//!
//! The control flow the host platform drives once the wizard has persisted
//! a configuration: prime the coordinator, construct one sensor per symbol
//! the primed snapshot actually carries, subscribe them, start the refresh
//! loop.

use std::fmt;
use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::coordinator::UpdateCoordinator;
use crate::error::{CoordinatorError, SetupError};
use crate::fetcher::TickerFetcher;
use crate::sensor::{EntityPublisher, PriceSensor};

/// Running tracker for one configuration entry
///
/// Holds the coordinator and its attached sensors. Independently configured
/// entries get fully isolated trackers.
pub struct PriceTracker {
    fetcher: Arc<dyn TickerFetcher>,
    publisher: Arc<dyn EntityPublisher>,
    coordinator: Arc<UpdateCoordinator>,
    sensors: Vec<Arc<PriceSensor>>,
    config: TrackerConfig,
}

impl fmt::Debug for PriceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceTracker")
            .field("sensors", &self.sensors.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Sets up a tracker from a persisted configuration
///
/// Symbols the primed snapshot does not carry are logged and skipped; they
/// get no sensor until a reload lists them.
///
/// # Errors
/// [`SetupError::Config`] on an invalid configuration and
/// [`SetupError::Coordinator`] when the priming fetch fails or yields no
/// data. Either one aborts this configuration attempt.
pub async fn setup_entry(
    fetcher: Arc<dyn TickerFetcher>,
    publisher: Arc<dyn EntityPublisher>,
    config: TrackerConfig,
) -> Result<PriceTracker, SetupError> {
    config.validate()?;

    let coordinator = Arc::new(UpdateCoordinator::new(
        fetcher.clone(),
        config.currency,
        config.update_interval,
    ));
    coordinator.prime_once().await?;

    let snapshot = match coordinator.snapshot() {
        Some(snapshot) => snapshot,
        None => {
            return Err(CoordinatorError::NotReady {
                currency: config.currency.code().to_string(),
            }
            .into())
        }
    };

    let mut sensors = Vec::new();
    for symbol in config.unique_symbols() {
        if snapshot.contains(&symbol) {
            let sensor = Arc::new(PriceSensor::new(Arc::clone(&coordinator), symbol));
            sensor.attach(publisher.clone());
            sensors.push(sensor);
        } else {
            tracing::warn!(
                symbol = %symbol,
                currency = %config.currency,
                "Symbol not found in ticker data; skipping sensor"
            );
        }
    }

    coordinator.start();

    Ok(PriceTracker { fetcher, publisher, coordinator, sensors, config })
}

impl PriceTracker {
    /// The coordinator driving this entry
    pub fn coordinator(&self) -> &Arc<UpdateCoordinator> {
        &self.coordinator
    }

    /// The sensors constructed for this entry
    pub fn sensors(&self) -> &[Arc<PriceSensor>] {
        &self.sensors
    }

    /// The configuration this entry runs with
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Applies a revised configuration through a full reload
    ///
    /// The running entry is torn down first, matching the host's
    /// options-update path. If the new configuration fails to set up, the
    /// entry stays stopped and the error tells the host to retry later.
    pub async fn reload(&mut self, config: TrackerConfig) -> Result<(), SetupError> {
        self.teardown();
        *self = setup_entry(self.fetcher.clone(), self.publisher.clone(), config).await?;
        Ok(())
    }

    /// Detaches every sensor and stops the refresh loop
    pub fn teardown(&self) {
        for sensor in &self.sensors {
            sensor.detach();
        }
        self.coordinator.shutdown();
    }
}
