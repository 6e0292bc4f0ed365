//! Generation job queue.
//!
//! FIFO queue of generation jobs keyed by order ID with bounded concurrency.
//! Admission is deduplicated: an order that is already waiting or running is
//! never enqueued twice. A failing job never stops the drain loop.

mod job_queue;
mod types;

pub use job_queue::JobQueue;
pub use types::{AddOutcome, JobRunner, QueueStatus, QueuedJob};
