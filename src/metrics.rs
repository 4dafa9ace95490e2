//! Prometheus metrics for request and prediction latency.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Prediction latency metric name.
pub const METRIC_PREDICTION_LATENCY: &str = "prediction_latency_ms";
/// Successful predictions counter metric name.
pub const METRIC_PREDICTIONS: &str = "predictions_total";
/// Failed predictions counter metric name.
pub const METRIC_PREDICTIONS_FAILED: &str = "predictions_failed_total";
/// Rejected prediction forms counter metric name.
pub const METRIC_VALIDATION_FAILURES: &str = "validation_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_PREDICTION_LATENCY,
        "Rating prediction latency in milliseconds"
    );

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_counter!(METRIC_PREDICTIONS, "Total number of successful predictions");
    describe_counter!(
        METRIC_PREDICTIONS_FAILED,
        "Total number of predictions that failed in the model"
    );
    describe_counter!(
        METRIC_VALIDATION_FAILURES,
        "Total number of prediction requests rejected as invalid"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter on its own listener.
///
/// Must be called from inside a Tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
    counter!(
        METRIC_HTTP_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment successful predictions counter.
pub fn inc_predictions() {
    counter!(METRIC_PREDICTIONS).increment(1);
}

/// Increment failed predictions counter.
pub fn inc_predictions_failed() {
    counter!(METRIC_PREDICTIONS_FAILED).increment(1);
}

/// Increment validation failures counter.
pub fn inc_validation_failures() {
    counter!(METRIC_VALIDATION_FAILURES).increment(1);
}

/// Axum middleware recording latency and count per matched route.
///
/// Installed with `route_layer`, so only matched routes reach it.
pub async fn track_http(matched: MatchedPath, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;
    record_http_latency(start, matched.as_str(), response.status().as_u16());
    response
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a prediction.
pub fn timer_prediction() -> LatencyTimer {
    LatencyTimer::new(METRIC_PREDICTION_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = LatencyTimer::new("test_metric");
        sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        assert!(elapsed >= 9.0);
    }
}
