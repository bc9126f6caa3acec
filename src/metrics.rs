/// Prometheus metrics for the catalog server
///
/// Counters and histograms are registered once in a process-wide collector
/// and exposed in text format on `/metrics`.
use crate::store::Operation;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for completed HTTP requests
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    /// Matched route template, e.g. `/store/category/{id}`
    pub route: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RouteLabels {
    pub route: String,
}

/// Labels for the error boundary
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    /// `not_found`, `store`, `render` or `internal`
    pub kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StoreLabels {
    pub collection: String,
    pub operation: String,
    /// `ok` or `error`
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct FormLabels {
    pub form: String,
}

/// Central metrics collector with Prometheus registry
///
/// Counters are registered without the `_total` suffix; the text encoder adds it.
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    pub http_requests_total: Family<RequestLabels, Counter>,
    pub http_request_duration_seconds: Family<RouteLabels, Histogram>,
    pub http_requests_in_flight: Gauge,
    pub http_errors_total: Family<ErrorLabels, Counter>,
    pub store_operations_total: Family<StoreLabels, Counter>,
    pub validation_failures_total: Family<FormLabels, Counter>,
}

impl MetricsCollector {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Total number of HTTP requests by method, route and status",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<RouteLabels, Histogram>::new_with_constructor(|| {
                // 1ms .. ~4s
                Histogram::new(exponential_buckets(0.001, 2.5, 10))
            });
        registry.register(
            "http_request_duration_seconds",
            "Request latency histogram in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of requests currently being processed",
            http_requests_in_flight.clone(),
        );

        let http_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "http_errors",
            "Requests answered by the error boundary, by kind",
            http_errors_total.clone(),
        );

        let store_operations_total = Family::<StoreLabels, Counter>::default();
        registry.register(
            "store_operations",
            "Document store operations by collection, operation and outcome",
            store_operations_total.clone(),
        );

        let validation_failures_total = Family::<FormLabels, Counter>::default();
        registry.register(
            "validation_failures",
            "Rejected form submissions by form",
            validation_failures_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            http_errors_total,
            store_operations_total,
            validation_failures_total,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        if let Err(error) = encode(&mut buffer, &registry) {
            tracing::warn!(%error, "failed to encode metrics");
        }
        buffer
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, duration: Duration) {
        self.http_requests_total
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                route: route.to_string(),
                status: status.to_string(),
            })
            .inc();

        self.http_request_duration_seconds
            .get_or_create(&RouteLabels {
                route: route.to_string(),
            })
            .observe(duration.as_secs_f64());
    }

    pub fn record_error(&self, kind: &str) {
        self.http_errors_total
            .get_or_create(&ErrorLabels {
                kind: kind.to_string(),
            })
            .inc();
    }

    pub fn record_store_operation(&self, collection: &str, operation: Operation, ok: bool) {
        self.store_operations_total
            .get_or_create(&StoreLabels {
                collection: collection.to_string(),
                operation: operation.to_string(),
                outcome: if ok { "ok" } else { "error" }.to_string(),
            })
            .inc();
    }

    pub fn record_validation_failure(&self, form: &str) {
        self.validation_failures_total
            .get_or_create(&FormLabels {
                form: form.to_string(),
            })
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for request timing
///
/// Counts the request as in flight until [`RequestTimer::finish`] records it.
/// A guard dropped without finishing (the handler future was cancelled)
/// only releases the in-flight slot.
pub struct RequestTimer {
    start: Instant,
    finished: bool,
}

impl RequestTimer {
    pub fn start() -> Self {
        METRICS.http_requests_in_flight.inc();
        Self {
            start: Instant::now(),
            finished: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Records the completed request and returns its latency.
    pub fn finish(mut self, method: &str, route: &str, status: u16) -> Duration {
        let duration = self.start.elapsed();
        METRICS.record_request(method, route, status, duration);
        METRICS.http_requests_in_flight.dec();
        self.finished = true;
        duration
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.finished {
            METRICS.http_requests_in_flight.dec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new();
        let output = collector.encode();

        // Counter names gain their `_total` suffix on samples only.
        assert!(output.contains("# TYPE http_requests counter"));
        assert!(output.contains("# TYPE http_request_duration_seconds histogram"));
        assert!(output.contains("# TYPE http_requests_in_flight gauge"));
        assert!(output.contains("# TYPE http_errors counter"));
        assert!(output.contains("# TYPE store_operations counter"));
        assert!(output.contains("# TYPE validation_failures counter"));
    }

    #[test]
    fn test_record_request() {
        let collector = MetricsCollector::new();
        collector.record_request(
            "GET",
            "/store/categories",
            200,
            Duration::from_millis(12),
        );

        let output = collector.encode();
        assert!(output.contains("route=\"/store/categories\""));
        assert!(output.contains("status=\"200\""));
    }

    #[test]
    fn test_store_and_form_counters() {
        let collector = MetricsCollector::new();
        collector.record_store_operation("products", Operation::FindById, true);
        collector.record_store_operation("products", Operation::FindById, false);
        collector.record_validation_failure("category");
        collector.record_validation_failure("category");
        collector.record_error("not_found");

        let output = collector.encode();
        assert!(output.contains("operation=\"find_by_id\""));
        assert!(output.contains("outcome=\"error\""));
        assert!(output.contains("validation_failures_total{form=\"category\"} 2"));
        assert!(output.contains("http_errors_total{kind=\"not_found\"} 1"));
    }

    #[test]
    fn test_concurrent_metrics() {
        use std::thread;

        let collector = Arc::new(MetricsCollector::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let collector = collector.clone();
                thread::spawn(move || {
                    let route = format!("/route_{}", i % 3);
                    collector.record_request("GET", &route, 200, Duration::from_millis(i));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let output = collector.encode();
        assert!(output.contains("/route_0"));
        assert!(output.contains("/route_2"));
    }
}
