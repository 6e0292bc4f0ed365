//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Webhook ingestion (events by type and result)
//! - Job queue (admissions, settlements)
//! - Generation runs (results, durations)
//! - Notifications (admissions, settlements)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Webhook Metrics
// =============================================================================

/// Webhook events total by type and result.
pub static WEBHOOK_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidforge_webhook_events_total", "Total webhook events"),
        &["type", "result"], // result: "processed", "duplicate", "ignored"
    )
    .unwrap()
});

// =============================================================================
// Job Queue Metrics
// =============================================================================

/// Generation jobs admitted to the queue.
pub static JOBS_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidforge_jobs_enqueued_total",
        "Total generation jobs admitted to the queue",
    )
    .unwrap()
});

/// Generation jobs settled by result.
pub static JOBS_SETTLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidforge_jobs_settled_total",
            "Total generation jobs settled",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Generation Metrics
// =============================================================================

/// Generation runs total by result.
pub static GENERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vidforge_generations_total", "Total generation runs"),
        &["result"], // "success", "failed", "timeout"
    )
    .unwrap()
});

/// Generation run duration in seconds.
pub static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vidforge_generation_duration_seconds",
            "Duration of generation runs",
        )
        .buckets(vec![
            30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0, 2400.0,
        ]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Notification Metrics
// =============================================================================

/// Notifications queued for delivery.
pub static NOTIFICATIONS_ENQUEUED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vidforge_notifications_enqueued_total",
        "Total notifications queued for delivery",
    )
    .unwrap()
});

/// Notification delivery attempts settled by result.
pub static NOTIFICATIONS_SETTLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vidforge_notifications_settled_total",
            "Total notification delivery attempts settled",
        ),
        &["result"], // "sent", "retried", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(WEBHOOK_EVENTS.clone()),
        Box::new(JOBS_ENQUEUED.clone()),
        Box::new(JOBS_SETTLED.clone()),
        Box::new(GENERATIONS_TOTAL.clone()),
        Box::new(GENERATION_DURATION.clone()),
        Box::new(NOTIFICATIONS_ENQUEUED.clone()),
        Box::new(NOTIFICATIONS_SETTLED.clone()),
    ]
}
