//! Processed-event log: the idempotency gate for webhook ingestion.
//!
//! Inserting an idempotency key is the admission check. The insert and the
//! duplicate test are one atomic operation, so two concurrent deliveries of
//! the same event can never both be admitted.

mod sqlite;

pub use sqlite::SqliteEventLog;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for event log operations.
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Record stored for an admitted event.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event_type: String,
    pub payment_id: String,
    pub received_at: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(event_type: impl Into<String>, payment_id: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payment_id: payment_id.into(),
            received_at: Utc::now(),
        }
    }
}

/// Trait for the processed-event log.
pub trait EventLog: Send + Sync {
    /// Insert the key if it has not been seen before. Returns `true` when
    /// the key was admitted, `false` when it was already present.
    fn insert_if_absent(&self, idempotency_key: &str, record: &EventRecord)
        -> Result<bool, EventLogError>;

    /// Whether the key has already been processed.
    fn contains(&self, idempotency_key: &str) -> Result<bool, EventLogError>;
}
