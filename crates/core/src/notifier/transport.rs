//! Notification transport seam and job types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for notification delivery.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification API error: {0}")]
    Api(String),
    #[error("Cannot reach notification service: {0}")]
    Connection(String),
    #[error("Notification request timed out: {0}")]
    Timeout(String),
}

/// Provider-assigned delivery identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryId(pub String);

/// Content of a delivery notification.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    pub video_url: String,
    pub prompt: String,
    pub resolution: u32,
    pub duration_secs: u32,
}

/// A notification waiting for delivery.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub recipient: String,
    pub order_id: String,
    pub payload: NotificationPayload,
    /// Failed delivery attempts so far.
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
}

impl NotificationJob {
    pub fn new(
        recipient: impl Into<String>,
        order_id: impl Into<String>,
        payload: NotificationPayload,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            order_id: order_id.into(),
            payload,
            attempts: 0,
            queued_at: Utc::now(),
        }
    }
}

/// Trait for notification delivery backends.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, job: &NotificationJob) -> Result<DeliveryId, NotificationError>;
}
