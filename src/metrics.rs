//! Request metrics and statistics tracking for the prediction API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile calculation
const LATENCY_WINDOW: usize = 10_000;

/// How a `/predict` request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    BadRequest,
    ServerError,
}

/// Metrics collector shared by all request handlers
pub struct ServiceMetrics {
    /// Total `/predict` requests handled
    pub requests: AtomicU64,
    /// Requests answered with a prediction
    pub predictions: AtomicU64,
    /// Requests rejected as client errors
    pub bad_requests: AtomicU64,
    /// Requests failed with a server error
    pub server_errors: AtomicU64,
    /// Predictions made on unscaled input because the scaler failed
    pub scaler_fallbacks: AtomicU64,
    /// Request latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            predictions: AtomicU64::new(0),
            bad_requests: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
            scaler_fallbacks: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a finished `/predict` request
    pub fn record_request(&self, outcome: Outcome, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Outcome::Success => &self.predictions,
            Outcome::BadRequest => &self.bad_requests,
            Outcome::ServerError => &self.server_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Record a scaler failure that was recovered by using raw features
    pub fn record_scaler_fallback(&self) {
        self.scaler_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Latency statistics over the retained window
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests.load(Ordering::Relaxed);
        let latency = self.latency_stats();

        info!(
            requests = requests,
            predictions = self.predictions.load(Ordering::Relaxed),
            bad_requests = self.bad_requests.load(Ordering::Relaxed),
            server_errors = self.server_errors.load(Ordering::Relaxed),
            scaler_fallbacks = self.scaler_fallbacks.load(Ordering::Relaxed),
            throughput = format!("{:.2} req/s", self.throughput()),
            "Request summary"
        );

        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                max_us = latency.max_us,
                "Prediction latency"
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request latency statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Logs a metrics summary at a fixed interval
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run until the task is dropped
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick fires immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
