//! Testing utilities and mock implementations.
//!
//! Mock implementations of the external collaborator traits, allowing
//! full-pipeline tests without a browser agent or an email provider. They
//! live in the library so the server crate's tests can reuse them.

mod mock_agent;
mod mock_transport;

pub use mock_agent::MockRenderingAgent;
pub use mock_transport::MockNotificationTransport;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::order::CreateOrderRequest;

    /// Create a test order request with reasonable defaults.
    pub fn order_request(id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            id: id.to_string(),
            email: "customer@example.com".to_string(),
            prompt: format!("a test video for {}", id),
            resolution: 720,
            duration_secs: 10,
            aspect_ratio: "16:9".to_string(),
        }
    }
}
