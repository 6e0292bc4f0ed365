//! Video generation orders.
//!
//! An [`Order`] is created at checkout and advances through two independent
//! dimensions: its payment status (driven by payment webhooks) and its
//! generation status (driven by the job queue and orchestrator).

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteOrderStore;
pub use store::{CreateOrderRequest, OrderError, OrderStore, OrderUpdate};
pub use types::{Order, OrderStatus, PaymentStatus};
