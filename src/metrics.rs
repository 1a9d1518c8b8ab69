//! Fetch health metrics collection and reporting
//!
//! Tracks latency and success rate of ticker fetches. Purely diagnostic;
//! refresh behavior never depends on these numbers.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Aggregated fetch statistics
#[derive(Debug, Clone)]
pub struct FetchMetrics {
    /// Name of the upstream source
    pub source_name: String,
    /// 50th percentile fetch latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile fetch latency in milliseconds
    pub latency_p99_ms: f64,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Total number of fetches tracked
    pub total_fetches: u64,
    /// Number of failed fetches
    pub failed_fetches: u64,
}

impl FetchMetrics {
    /// Creates metrics with no data
    pub fn empty(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            latency_p50_ms: 0.0,
            latency_p99_ms: 0.0,
            success_rate: 1.0,
            total_fetches: 0,
            failed_fetches: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct CollectorInner {
    samples: VecDeque<LatencySample>,
    total_fetches: u64,
    failed_fetches: u64,
}

/// Collects and computes fetch metrics
///
/// Recording is synchronous so the refresh path never awaits for
/// bookkeeping.
pub struct MetricsCollector {
    source_name: String,
    inner: Mutex<CollectorInner>,
}

impl MetricsCollector {
    /// Creates a new collector for a source
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            inner: Mutex::new(CollectorInner {
                samples: VecDeque::with_capacity(MAX_SAMPLES),
                ..CollectorInner::default()
            }),
        }
    }

    /// Records a fetch with its duration and outcome
    pub fn record_fetch(&self, duration: Duration, success: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        inner.total_fetches += 1;
        if !success {
            inner.failed_fetches += 1;
        }

        if inner.samples.len() >= MAX_SAMPLES {
            inner.samples.pop_front();
        }
        inner.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Computes current metrics from collected samples
    pub fn snapshot(&self) -> FetchMetrics {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if inner.samples.is_empty() {
            return FetchMetrics::empty(&self.source_name);
        }

        let mut latencies: Vec<f64> = inner
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let success_rate = if inner.total_fetches > 0 {
            (inner.total_fetches - inner.failed_fetches) as f64 / inner.total_fetches as f64
        } else {
            1.0
        };

        FetchMetrics {
            source_name: self.source_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            success_rate,
            total_fetches: inner.total_fetches,
            failed_fetches: inner.failed_fetches,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_tracks_totals_and_success_rate() {
        let collector = MetricsCollector::new("test");

        collector.record_fetch(Duration::from_millis(100), true);
        collector.record_fetch(Duration::from_millis(200), true);
        collector.record_fetch(Duration::from_millis(150), false);

        let metrics = collector.snapshot();

        assert_eq!(metrics.source_name, "test");
        assert_eq!(metrics.total_fetches, 3);
        assert_eq!(metrics.failed_fetches, 1);
        assert!(metrics.success_rate > 0.6 && metrics.success_rate < 0.7);
    }

    #[test]
    fn empty_collector_reports_clean_slate() {
        let collector = MetricsCollector::new("test");
        let metrics = collector.snapshot();
        assert_eq!(metrics.total_fetches, 0);
        assert_eq!(metrics.success_rate, 1.0);
    }

    #[test]
    fn percentile_of_sorted_window() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(percentile(&values, 50.0), 5.0);
        assert_eq!(percentile(&values, 99.0), 10.0);
    }
}
