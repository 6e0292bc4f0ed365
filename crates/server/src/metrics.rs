//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the vidforge server:
//! - HTTP request metrics (latency, counts, errors)
//! - Queue and notification gauges (collected dynamically)
//! - Core pipeline counters registered from the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidforge_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics (collected dynamically)
// =============================================================================

/// Generation jobs waiting in the queue.
pub static QUEUE_WAITING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidforge_queue_waiting",
        "Number of generation jobs waiting in the queue",
    )
    .unwrap()
});

/// Generation jobs currently running.
pub static QUEUE_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidforge_queue_active",
        "Number of generation jobs currently running",
    )
    .unwrap()
});

// =============================================================================
// Notification Metrics (collected dynamically)
// =============================================================================

/// Notifications waiting for delivery.
pub static NOTIFICATIONS_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidforge_notifications_pending",
        "Number of notifications waiting for delivery",
    )
    .unwrap()
});

/// Notifications that exhausted their retries.
pub static NOTIFICATIONS_PERMANENT_FAILURES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "vidforge_notifications_permanent_failures",
        "Number of notifications that exhausted their retries",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Queue
    registry.register(Box::new(QUEUE_WAITING.clone())).unwrap();
    registry.register(Box::new(QUEUE_ACTIVE.clone())).unwrap();

    // Notifications
    registry
        .register(Box::new(NOTIFICATIONS_PENDING.clone()))
        .unwrap();
    registry
        .register(Box::new(NOTIFICATIONS_PERMANENT_FAILURES.clone()))
        .unwrap();

    // Core metrics (webhook, queue, generation, notification counters)
    for metric in vidforge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding metrics to update gauges with current values
/// from the job queue and notification dispatcher.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let queue_status = state.queue().status();
    QUEUE_WAITING.set(queue_status.waiting.len() as i64);
    QUEUE_ACTIVE.set(queue_status.active.len() as i64);

    let dispatcher_status = state.dispatcher().status();
    NOTIFICATIONS_PENDING.set(dispatcher_status.queue_length as i64);
    NOTIFICATIONS_PERMANENT_FAILURES.set(dispatcher_status.permanent_failures as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    // Order IDs are caller-supplied payment IDs; collapse the path segment
    // so label cardinality stays bounded.
    let order_regex = regex_lite::Regex::new(r"/orders/[^/]+").unwrap();
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();

    let result = order_regex.replace_all(path, "/orders/{id}");
    let result = uuid_regex.replace_all(&result, "{id}");
    result.to_string()
}
