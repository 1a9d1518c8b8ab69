//! Price sensor entities
//!
//! One sensor per configured (symbol, currency) pair. Sensors are read-only
//! projections of the coordinator's latest snapshot; they never fetch and
//! never mutate coordinator state.

use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::constants::DOMAIN;
use crate::coordinator::{ListenerHandle, UpdateCoordinator};
use crate::types::{Currency, SensorMetadata};

/// Host platform write-back capability
///
/// Injected by the embedder; called with the sensor's stable entity id
/// every time a refresh cycle completes, so the host can re-read and
/// publish the entity's state.
pub trait EntityPublisher: Send + Sync {
    /// Pushes the entity's current state to the host platform
    fn write_state(&self, entity_id: &str);
}

/// Price sensor for one tracked symbol
pub struct PriceSensor {
    coordinator: Arc<UpdateCoordinator>,
    symbol: String,
    name: String,
    unique_id: String,
    listener: Mutex<Option<ListenerHandle>>,
}

impl PriceSensor {
    /// Creates a sensor bound to the coordinator's currency
    pub fn new(coordinator: Arc<UpdateCoordinator>, symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        let code = coordinator.currency().code();
        let name = format!("Bitpanda Price Tracker {}/{}", symbol, code);
        let unique_id = format!("{}_{}_{}", DOMAIN, symbol, code);
        Self {
            coordinator,
            symbol,
            name,
            unique_id,
            listener: Mutex::new(None),
        }
    }

    /// Current price from the latest snapshot
    ///
    /// Absent when no snapshot exists yet or the symbol dropped out of the
    /// upstream response; never stale data from another currency, since the
    /// coordinator is bound to exactly one.
    pub fn current_price(&self) -> Option<f64> {
        self.coordinator
            .snapshot()
            .and_then(|snapshot| snapshot.price(&self.symbol))
    }

    /// Host-facing attributes, with the next refresh in local time
    pub fn metadata(&self) -> SensorMetadata {
        let last_update = self
            .coordinator
            .snapshot()
            .and_then(|snapshot| snapshot.get(&self.symbol).map(|entry| entry.last_updated));

        SensorMetadata {
            last_update,
            next_update: self.coordinator.next_refresh_at().with_timezone(&Local),
            symbol: self.symbol.clone(),
            update_interval: self.coordinator.interval(),
        }
    }

    /// Tracked symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Display name, `Bitpanda Price Tracker {symbol}/{currency}`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable identifier, unique per (symbol, currency) across restarts
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Quote currency of the coordinator this sensor reads from
    pub fn currency(&self) -> Currency {
        self.coordinator.currency()
    }

    /// Unit of measurement: the currency code
    pub fn unit(&self) -> &'static str {
        self.currency().code()
    }

    /// Display icon keyed by currency
    pub fn icon(&self) -> &'static str {
        self.currency().icon()
    }

    /// Subscribes to refresh notifications, publishing through the host
    ///
    /// Attaching again replaces the previous registration.
    pub fn attach(&self, publisher: Arc<dyn EntityPublisher>) {
        let entity_id = self.unique_id.clone();
        let handle = self
            .coordinator
            .add_listener(Arc::new(move || publisher.write_state(&entity_id)));

        let mut slot = self.listener.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            self.coordinator.remove_listener(previous);
        }
    }

    /// Unsubscribes from refresh notifications
    pub fn detach(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            self.coordinator.remove_listener(handle);
        }
    }
}

impl Drop for PriceSensor {
    fn drop(&mut self) {
        self.detach();
    }
}
