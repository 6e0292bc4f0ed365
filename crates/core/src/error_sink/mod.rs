//! Failure recording.
//!
//! The error sink captures component failures for later inspection. It must
//! never propagate failures of its own: a broken sink degrades to a tracing
//! line, never to a lost webhook or a failed job.

mod sqlite;

pub use sqlite::SqliteErrorSink;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Context attached to a recorded failure.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Component that observed the failure, e.g. "webhook", "generator".
    pub component: String,
    /// Order the failure relates to, when known.
    pub order_id: Option<String>,
    /// Free-form structured details.
    pub details: Option<Value>,
}

impl ErrorContext {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            order_id: None,
            details: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// A recorded failure, as read back from the sink.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub id: i64,
    pub component: String,
    pub order_id: Option<String>,
    pub message: String,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Trait for failure recorders. `record` is infallible by contract.
pub trait ErrorSink: Send + Sync {
    /// Record a failure. Implementations swallow their own errors.
    fn record(&self, message: &str, context: ErrorContext);
}

/// Sink that only writes tracing output. Used when no database sink is
/// wired up, and as the fallback inside failing sinks.
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn record(&self, message: &str, context: ErrorContext) {
        tracing::error!(
            component = %context.component,
            order_id = ?context.order_id,
            "{}",
            message
        );
    }
}
