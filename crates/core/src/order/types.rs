//! Order types and state helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment lifecycle of an order, driven by payment provider webhooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No payment event seen yet.
    None,
    /// Payment initiated but not confirmed.
    PaymentStarted,
    /// Payment confirmed. Sticky: a later `payment_started` never
    /// downgrades this.
    PaymentCompleted,
    /// Payment failed or was reversed.
    PaymentBounced,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::None => "none",
            PaymentStatus::PaymentStarted => "payment_started",
            PaymentStatus::PaymentCompleted => "payment_completed",
            PaymentStatus::PaymentBounced => "payment_bounced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(PaymentStatus::None),
            "payment_started" => Some(PaymentStatus::PaymentStarted),
            "payment_completed" => Some(PaymentStatus::PaymentCompleted),
            "payment_bounced" => Some(PaymentStatus::PaymentBounced),
            _ => None,
        }
    }

    /// Whether the order is paid for and eligible for generation.
    pub fn is_completed(&self) -> bool {
        matches!(self, PaymentStatus::PaymentCompleted)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generation lifecycle of an order.
///
/// pending_generation -> queued -> processing -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment confirmed, not yet admitted to the queue.
    PendingGeneration,
    /// Waiting in the job queue.
    Queued,
    /// A generation run is in flight.
    Processing,
    /// Artifact produced, terminal.
    Completed,
    /// Generation or payment failed, terminal for this attempt.
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingGeneration => "pending_generation",
            OrderStatus::Queued => "queued",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_generation" => Some(OrderStatus::PendingGeneration),
            "queued" => Some(OrderStatus::Queued),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states for a generation attempt. A failed order may still
    /// be re-submitted explicitly through the API.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    /// States where a job is waiting or running on behalf of the order.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Queued | OrderStatus::Processing)
    }

    /// Whether a new generation job may be admitted for the order.
    pub fn is_generation_eligible(&self) -> bool {
        matches!(self, OrderStatus::PendingGeneration | OrderStatus::Failed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A paid video generation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID, also the payment ID used by webhook events.
    pub id: String,
    /// Customer email for the delivery notification.
    pub email: String,
    /// Generation prompt, also used to match the produced artifact.
    pub prompt: String,
    /// Vertical resolution, e.g. 720.
    pub resolution: u32,
    /// Requested clip length in seconds.
    pub duration_secs: u32,
    /// Aspect ratio, e.g. "16:9".
    pub aspect_ratio: String,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    /// Chain ID reported by the payment provider, if any.
    pub payment_chain_id: Option<String>,
    /// Transaction hash reported by the payment provider, if any.
    pub payment_tx_hash: Option<String>,
    /// URL of the generated video, set on completion.
    pub video_url: Option<String>,
    /// Failure reason, set when the order fails.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall-clock generation time, set on completion.
    pub processing_time_secs: Option<i64>,
}
