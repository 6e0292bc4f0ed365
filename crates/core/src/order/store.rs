//! Order storage trait and request types.

use thiserror::Error;

use super::{Order, OrderStatus, PaymentStatus};

/// Error type for order storage operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order already exists: {0}")]
    AlreadyExists(String),
    #[error("Database error: {0}")]
    Database(String),
}

/// Request to create a new order.
///
/// Orders are normally created at checkout, before any payment event
/// arrives. `id` doubles as the payment ID that webhooks reference.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub id: String,
    pub email: String,
    pub prompt: String,
    pub resolution: u32,
    pub duration_secs: u32,
    pub aspect_ratio: String,
}

/// Partial update applied to an order. `None` fields are left untouched;
/// the store stamps `updated_at` on every update.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub payment_status: Option<PaymentStatus>,
    pub status: Option<OrderStatus>,
    pub payment_chain_id: Option<String>,
    pub payment_tx_hash: Option<String>,
    pub video_url: Option<String>,
    pub error: Option<String>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub processing_time_secs: Option<i64>,
}

impl OrderUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_video_url(mut self, video_url: impl Into<String>) -> Self {
        self.video_url = Some(video_url.into());
        self
    }
}

/// Trait for order storage backends.
pub trait OrderStore: Send + Sync {
    /// Create a new order.
    fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError>;

    /// Get an order by ID.
    fn get(&self, id: &str) -> Result<Option<Order>, OrderError>;

    /// Apply a partial update, returning the updated order.
    fn update(&self, id: &str, update: OrderUpdate) -> Result<Order, OrderError>;

    /// Count orders in a given generation status.
    fn count_by_status(&self, status: OrderStatus) -> Result<i64, OrderError>;
}
