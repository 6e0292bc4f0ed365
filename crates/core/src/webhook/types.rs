//! Webhook event types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for webhook ingestion. Authentication is the only failure a
/// sender ever sees.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook credentials")]
    Authentication,
}

/// A payment event as delivered by the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    /// Payment ID; doubles as the order ID.
    pub payment_id: String,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl PaymentEvent {
    pub fn kind(&self) -> PaymentEventType {
        PaymentEventType::parse(&self.event_type)
    }
}

/// Recognized payment event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    PaymentStarted,
    PaymentCompleted,
    PaymentBounced,
    Unknown(String),
}

impl PaymentEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment_started" => PaymentEventType::PaymentStarted,
            "payment_completed" => PaymentEventType::PaymentCompleted,
            "payment_bounced" => PaymentEventType::PaymentBounced,
            other => PaymentEventType::Unknown(other.to_string()),
        }
    }
}

/// Result of processing an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event was admitted and dispatched.
    Processed,
    /// The idempotency key was seen before; nothing was done.
    Duplicate,
    /// The event was acknowledged but deliberately not acted on
    /// (unknown type, missing idempotency key, skipped by policy).
    Ignored,
}
