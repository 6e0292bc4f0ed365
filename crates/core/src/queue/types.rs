//! Queue types and the job runner seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::generator::GenerationError;

/// The unit of work executed for a queued order. The generation
/// orchestrator is the production implementation; tests use scripted
/// runners.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, order_id: &str) -> Result<(), GenerationError>;
}

/// A job waiting in (or re-admitted to) the queue.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub order_id: String,
    /// Completed runs so far. 0 for a fresh job.
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
}

impl QueuedJob {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            attempts: 0,
            queued_at: Utc::now(),
        }
    }
}

/// Result of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Admitted at the given position among waiting jobs (0 = next up).
    Added { position: usize },
    /// The order is already waiting; not enqueued again.
    AlreadyQueued,
    /// The order is currently running; not enqueued again.
    AlreadyActive,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added { .. })
    }
}

/// Snapshot of the queue for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queue_length: usize,
    /// Waiting order IDs in FIFO order.
    pub waiting: Vec<String>,
    /// Order IDs currently running.
    pub active: Vec<String>,
    pub is_processing: bool,
}
