//! Shared update coordinator
//!
//! Owns the single refresh cycle for one configured currency: one timer,
//! at most one fetch in flight, one snapshot swap per completed cycle.
//! Sensors read the current snapshot synchronously and are notified through
//! registered listeners; they never poll on their own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::{CoordinatorError, TickerError};
use crate::fetcher::TickerFetcher;
use crate::metrics::{FetchMetrics, MetricsCollector};
use crate::types::{CoordinatorState, Currency, TickerSnapshot, UpdateInterval};

/// Callback invoked once per completed refresh cycle, success or failure
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Identifies a registered listener for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Update coordinator for one configured currency
///
/// Fetches the ticker on a fixed cadence through the injected
/// [`TickerFetcher`], stores the latest [`TickerSnapshot`] behind an atomic
/// reference swap and fans completion out to registered listeners. A failed
/// cycle leaves the previous snapshot serving; availability is favored over
/// freshness.
///
/// Each configured currency/symbol set gets its own isolated coordinator;
/// nothing is shared across instances.
pub struct UpdateCoordinator {
    fetcher: Arc<dyn TickerFetcher>,
    currency: Currency,
    interval: UpdateInterval,
    metrics: MetricsCollector,
    snapshot: RwLock<Option<Arc<TickerSnapshot>>>,
    next_refresh_at: RwLock<DateTime<Utc>>,
    state: RwLock<CoordinatorState>,
    listeners: RwLock<HashMap<u64, Listener>>,
    next_listener_id: AtomicU64,
    refresh_gate: AsyncMutex<()>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateCoordinator {
    /// Creates a coordinator; no fetch happens until [`Self::prime_once`]
    pub fn new(
        fetcher: Arc<dyn TickerFetcher>,
        currency: Currency,
        interval: UpdateInterval,
    ) -> Self {
        let metrics = MetricsCollector::new(fetcher.source_name());
        Self {
            fetcher,
            currency,
            interval,
            metrics,
            snapshot: RwLock::new(None),
            next_refresh_at: RwLock::new(Utc::now() + interval.to_chrono()),
            state: RwLock::new(CoordinatorState::Uninitialized),
            listeners: RwLock::new(HashMap::new()),
            next_listener_id: AtomicU64::new(0),
            refresh_gate: AsyncMutex::new(()),
            poll_task: Mutex::new(None),
        }
    }

    /// Performs the first refresh, before any sensor exists
    ///
    /// # Errors
    /// [`CoordinatorError::UpdateFailed`] if the fetch fails and
    /// [`CoordinatorError::NotReady`] if it succeeds without yielding a
    /// single symbol. Both must abort entity setup for this configuration
    /// attempt.
    pub async fn prime_once(&self) -> Result<(), CoordinatorError> {
        let _gate = self.refresh_gate.lock().await;
        self.run_cycle().await.map_err(CoordinatorError::UpdateFailed)?;

        let populated = read(&self.snapshot)
            .as_ref()
            .is_some_and(|snapshot| !snapshot.is_empty());
        if !populated {
            return Err(CoordinatorError::NotReady {
                currency: self.currency.code().to_string(),
            });
        }
        Ok(())
    }

    /// Starts the background refresh loop
    ///
    /// The loop sleeps one interval first; [`Self::prime_once`] has already
    /// produced the initial snapshot. Cycle failures are logged and
    /// swallowed so stale data keeps serving the sensors.
    pub fn start(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tracing::info!(
                currency = %coordinator.currency,
                interval_secs = coordinator.interval.duration().as_secs(),
                "Starting ticker refresh loop"
            );

            loop {
                sleep(coordinator.interval.duration()).await;

                if let Err(e) = coordinator.refresh_now().await {
                    tracing::warn!(error = %e, "Scheduled refresh failed; keeping last snapshot");
                }
            }
        });

        let mut slot = self.poll_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Runs one refresh outside the regular schedule
    ///
    /// If a refresh is already in flight the call is skipped, never queued:
    /// the in-flight cycle will notify listeners when it lands.
    pub async fn refresh_now(&self) -> Result<(), CoordinatorError> {
        let _gate = match self.refresh_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) => {
                tracing::debug!("Refresh already in flight; skipping");
                return Ok(());
            }
        };
        self.run_cycle().await.map_err(CoordinatorError::UpdateFailed)
    }

    /// One complete cycle: fetch, swap or keep, reschedule, notify
    ///
    /// The caller holds the refresh gate. `next_refresh_at` advances and
    /// listeners fire on both outcomes.
    async fn run_cycle(&self) -> Result<(), TickerError> {
        *write(&self.state) = CoordinatorState::Refreshing;

        let started = Instant::now();
        let result = self.fetcher.fetch_ticker(self.currency).await;
        self.metrics.record_fetch(started.elapsed(), result.is_ok());

        let outcome = match result {
            Ok(snapshot) => {
                tracing::debug!(
                    count = snapshot.len(),
                    currency = %self.currency,
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Ticker refresh succeeded"
                );
                *write(&self.snapshot) = Some(Arc::new(snapshot));
                *write(&self.state) = CoordinatorState::Ready;
                Ok(())
            }
            Err(error) => {
                // Previous snapshot, if any, stays in place untouched.
                *write(&self.state) = CoordinatorState::Degraded;
                Err(error)
            }
        };

        *write(&self.next_refresh_at) = Utc::now() + self.interval.to_chrono();
        self.notify_listeners();
        outcome
    }

    fn notify_listeners(&self) {
        let listeners: Vec<Listener> = read(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    /// Registers a listener; invoked exactly once per completed cycle
    pub fn add_listener(&self, listener: Listener) -> ListenerHandle {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        write(&self.listeners).insert(id, listener);
        ListenerHandle(id)
    }

    /// Removes a listener; it receives no further notifications
    pub fn remove_listener(&self, handle: ListenerHandle) {
        write(&self.listeners).remove(&handle.0);
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        read(&self.listeners).len()
    }

    /// The latest snapshot, absent until the first successful fetch
    pub fn snapshot(&self) -> Option<Arc<TickerSnapshot>> {
        read(&self.snapshot).clone()
    }

    /// When the next scheduled refresh is due
    pub fn next_refresh_at(&self) -> DateTime<Utc> {
        *read(&self.next_refresh_at)
    }

    /// Current lifecycle state
    pub fn state(&self) -> CoordinatorState {
        *read(&self.state)
    }

    /// Configured quote currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Configured refresh cadence
    pub fn interval(&self) -> UpdateInterval {
        self.interval
    }

    /// Fetch health over the recent sample window
    pub fn fetch_metrics(&self) -> FetchMetrics {
        self.metrics.snapshot()
    }

    /// Stops the refresh loop and drops all listener registrations
    ///
    /// An in-flight fetch needs no explicit cancellation; its result is
    /// discarded along with the aborted task.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .poll_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
        write(&self.listeners).clear();
    }
}

impl Drop for UpdateCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self
            .poll_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crate::fetcher::mock::MockFetcher;

    fn coordinator_with(fetcher: MockFetcher) -> Arc<UpdateCoordinator> {
        Arc::new(UpdateCoordinator::new(
            Arc::new(fetcher),
            Currency::EUR,
            UpdateInterval::FiveMinutes,
        ))
    }

    #[tokio::test]
    async fn priming_populates_the_snapshot() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BTC", 50000.0), ("BEST", 0.55)]);
        let coordinator = coordinator_with(fetcher);

        let before = Utc::now();
        coordinator.prime_once().await.unwrap();

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.price("BTC"), Some(50000.0));
        assert_eq!(coordinator.state(), CoordinatorState::Ready);
        assert!(coordinator.next_refresh_at() >= before);
    }

    #[tokio::test]
    async fn priming_on_an_empty_ticker_is_not_ready() {
        let fetcher = MockFetcher::new();
        fetcher.push_empty();
        let coordinator = coordinator_with(fetcher);

        let err = coordinator.prime_once().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::NotReady { .. }));
        assert!(coordinator.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn priming_on_a_fetch_failure_propagates_update_failed() {
        let fetcher = MockFetcher::new();
        fetcher.push_error(TickerError::Status { status: 500, body: String::new() });
        let coordinator = coordinator_with(fetcher);

        let err = coordinator.prime_once().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::UpdateFailed(_)));
        assert!(coordinator.snapshot().is_none());
        assert_eq!(coordinator.state(), CoordinatorState::Degraded);
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot_wholesale() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BTC", 50000.0)]);
        fetcher.push_prices(&[("ETH", 2900.0)]);
        let coordinator = coordinator_with(fetcher);

        coordinator.prime_once().await.unwrap();
        coordinator.refresh_now().await.unwrap();

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.price("ETH"), Some(2900.0));
        assert!(!snapshot.contains("BTC"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_stale_snapshot_and_reschedules() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BTC", 50000.0)]);
        fetcher.push_error(TickerError::InvalidResponse("boom".to_string()));
        let coordinator = coordinator_with(fetcher);

        coordinator.prime_once().await.unwrap();
        let scheduled_after_prime = coordinator.next_refresh_at();

        let err = coordinator.refresh_now().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::UpdateFailed(_)));

        let snapshot = coordinator.snapshot().unwrap();
        assert_eq!(snapshot.price("BTC"), Some(50000.0));
        assert_eq!(coordinator.state(), CoordinatorState::Degraded);
        assert!(coordinator.next_refresh_at() >= scheduled_after_prime);
    }

    #[tokio::test]
    async fn listeners_fire_once_per_cycle_until_removed() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BTC", 50000.0)]);
        fetcher.push_error(TickerError::InvalidResponse("boom".to_string()));
        fetcher.push_prices(&[("BTC", 50100.0)]);
        let coordinator = coordinator_with(fetcher);

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let handle = coordinator.add_listener(Arc::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        }));

        coordinator.prime_once().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Failure cycles notify too; sensors re-render from stale data.
        let _ = coordinator.refresh_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        coordinator.remove_listener(handle);
        coordinator.refresh_now().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_fetch() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_prices(&[("BTC", 50000.0)]);
        fetcher.set_delay(Duration::from_millis(500));
        let coordinator = Arc::new(UpdateCoordinator::new(
            fetcher.clone(),
            Currency::EUR,
            UpdateInterval::FiveMinutes,
        ));

        let background = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.refresh_now().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Second call lands while the first is still in flight: skipped.
        coordinator.refresh_now().await.unwrap();
        background.await.unwrap().unwrap();

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(coordinator.snapshot().unwrap().price("BTC"), Some(50000.0));
    }

    #[tokio::test]
    async fn shutdown_drops_all_listeners() {
        let fetcher = MockFetcher::new();
        fetcher.push_prices(&[("BTC", 50000.0)]);
        let coordinator = coordinator_with(fetcher);

        coordinator.prime_once().await.unwrap();
        coordinator.start();
        coordinator.add_listener(Arc::new(|| {}));
        assert_eq!(coordinator.listener_count(), 1);

        coordinator.shutdown();
        assert_eq!(coordinator.listener_count(), 0);
    }
}
