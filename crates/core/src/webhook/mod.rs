//! Payment webhook ingestion.
//!
//! Events are authenticated with a shared secret, deduplicated through the
//! processed-event log, and dispatched onto the order state machine. The
//! only failure a sender can observe is bad credentials; everything past
//! that point is acknowledged and handled internally.

mod ingestor;
mod types;

pub use ingestor::WebhookIngestor;
pub use types::{IngestOutcome, PaymentEvent, PaymentEventType, WebhookError};
