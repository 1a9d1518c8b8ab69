//! Fetcher abstraction over the upstream ticker API
//!
//! The host platform injects the HTTP capability through this seam; the
//! coordinator and the setup wizard never construct sessions themselves.

use async_trait::async_trait;

use crate::error::TickerError;
use crate::types::{Currency, TickerSnapshot};

/// Capability for fetching one complete ticker snapshot
///
/// A fetch projects the upstream payload down to the symbols that quote a
/// price in the requested currency. Retries are not the fetcher's business;
/// the coordinator's schedule is the only retry mechanism.
#[async_trait]
pub trait TickerFetcher: Send + Sync {
    /// Fetches the current ticker, projected to the given currency
    ///
    /// # Errors
    /// [`TickerError::Network`] on transport or timeout failure,
    /// [`TickerError::Status`] on a non-2xx response and
    /// [`TickerError::InvalidResponse`] on a malformed body.
    async fn fetch_ticker(&self, currency: Currency) -> Result<TickerSnapshot, TickerError>;

    /// Returns the name of the upstream source
    fn source_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;

    use crate::types::SymbolPrice;

    /// Scriptable fetcher for tests
    ///
    /// Responses are consumed front to back, one per call; an exhausted
    /// queue fails the fetch.
    pub struct MockFetcher {
        responses: Mutex<VecDeque<Result<TickerSnapshot, TickerError>>>,
        call_count: Mutex<usize>,
        delay: Mutex<Option<Duration>>,
    }

    impl Default for MockFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                call_count: Mutex::new(0),
                delay: Mutex::new(None),
            }
        }

        /// Builds a snapshot holding the given symbol/price pairs, stamped now
        pub fn snapshot_from(pairs: &[(&str, f64)]) -> TickerSnapshot {
            let now = Utc::now();
            let prices: HashMap<String, SymbolPrice> = pairs
                .iter()
                .map(|(symbol, price)| {
                    (
                        symbol.to_string(),
                        SymbolPrice { price: Some(*price), last_updated: now },
                    )
                })
                .collect();
            TickerSnapshot::new(prices, now)
        }

        /// Queues a successful fetch returning the given pairs
        pub fn push_prices(&self, pairs: &[(&str, f64)]) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(Self::snapshot_from(pairs)));
        }

        /// Queues a successful fetch that projected no symbols
        pub fn push_empty(&self) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(TickerSnapshot::new(HashMap::new(), Utc::now())));
        }

        /// Queues a failing fetch
        pub fn push_error(&self, error: TickerError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        /// Delays every fetch by the given duration
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl TickerFetcher for MockFetcher {
        async fn fetch_ticker(&self, _currency: Currency) -> Result<TickerSnapshot, TickerError> {
            *self.call_count.lock().unwrap() += 1;
            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Err(TickerError::InvalidResponse("mock exhausted".to_string()))
                })
        }

        fn source_name(&self) -> &'static str {
            "mock"
        }
    }
}
