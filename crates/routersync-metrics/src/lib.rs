use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use lazy_static::lazy_static;
use std::sync::Once;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Dispatcher metrics
    pub static ref OPERATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("operations_total", "Total number of dispatched operations"),
        &["operation"]
    ).expect("operations_total metric");

    pub static ref OPERATION_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("operation_errors_total", "Total number of failed operations"),
        &["operation", "kind"]
    ).expect("operation_errors_total metric");

    // Device adapter metrics
    pub static ref DEVICE_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("device_requests_total", "Total number of HTTP requests sent to routers"),
        &["method", "status"]
    ).expect("device_requests_total metric");

    pub static ref DEVICE_REQUEST_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("device_request_seconds", "Router request latency in seconds")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    ).expect("device_request_seconds metric");

    // Mirror writer metrics
    pub static ref MIRROR_ROWS_WRITTEN_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("mirror_rows_written_total", "Rows written into mirror tables"),
        &["kind"]
    ).expect("mirror_rows_written_total metric");

    pub static ref MIRROR_ROWS_SKIPPED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("mirror_rows_skipped_total", "Device rows that could not be mirrored"),
        &["kind"]
    ).expect("mirror_rows_skipped_total metric");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(OPERATIONS_TOTAL.clone()),
            Box::new(OPERATION_ERRORS_TOTAL.clone()),
            Box::new(DEVICE_REQUESTS_TOTAL.clone()),
            Box::new(DEVICE_REQUEST_SECONDS.clone()),
            Box::new(MIRROR_ROWS_WRITTEN_TOTAL.clone()),
            Box::new(MIRROR_ROWS_SKIPPED_TOTAL.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                tracing::warn!("failed to register metric: {}", e);
            }
        }
    });
}

pub fn record_operation(operation: &str) {
    OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn record_operation_error(operation: &str, kind: &str) {
    OPERATION_ERRORS_TOTAL.with_label_values(&[operation, kind]).inc();
}

pub fn record_device_request(method: &str, status: &str, seconds: f64) {
    DEVICE_REQUESTS_TOTAL.with_label_values(&[method, status]).inc();
    DEVICE_REQUEST_SECONDS.observe(seconds);
}

pub fn record_mirror_rows(kind: &str, written: u64, skipped: u64) {
    MIRROR_ROWS_WRITTEN_TOTAL.with_label_values(&[kind]).inc_by(written);
    MIRROR_ROWS_SKIPPED_TOTAL.with_label_values(&[kind]).inc_by(skipped);
}

/// Gather metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();

        record_operation("sync-vlans");
        record_operation_error("sync-vlans", "device");
        record_device_request("GET", "200", 0.05);
        record_mirror_rows("vlan", 3, 1);

        let metrics = gather_metrics();
        assert!(metrics.contains("operations_total"));
        assert!(metrics.contains("device_request_seconds"));
        assert!(metrics.contains("mirror_rows_skipped_total"));
    }
}
