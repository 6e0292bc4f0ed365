//! Generation error taxonomy.

use thiserror::Error;

use crate::order::OrderError;

use super::AgentError;

/// Error type for a generation run. `AuthFailure`, `ConfigFailure`,
/// `SubmitFailure` and `PollTimeout` map to the protocol phase that gave
/// up; `Agent` covers session management failures outside a phase.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Rendering service login failed: {0}")]
    AuthFailure(String),

    #[error("Applying generation parameters failed: {0}")]
    ConfigFailure(String),

    #[error("Generation submit failed: {0}")]
    SubmitFailure(String),

    #[error("Video generation timeout after {0} seconds")]
    PollTimeout(u64),

    #[error("Rendering agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Order store error: {0}")]
    Store(#[from] OrderError),
}
