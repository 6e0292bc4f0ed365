//! Rendering agent abstraction.
//!
//! Everything that touches the rendering service's browser UI sits behind
//! [`RenderingAgent`], so orchestration logic never sees selectors or DOM
//! heuristics and tests can script the whole protocol.

use async_trait::async_trait;
use thiserror::Error;

use crate::order::Order;

/// Error type for rendering agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent request timed out: {0}")]
    Timeout(String),
    #[error("Cannot reach agent: {0}")]
    Connection(String),
    #[error("Agent HTTP error: {0}")]
    Http(String),
    #[error("Agent protocol error: {0}")]
    Protocol(String),
}

/// Handle to an open browser session on the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Rendering service account credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Parameters applied before submitting a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParams {
    pub aspect_ratio: String,
    pub resolution: u32,
    pub duration_secs: u32,
}

impl GenerationParams {
    pub fn from_order(order: &Order) -> Self {
        Self {
            aspect_ratio: order.aspect_ratio.clone(),
            resolution: order.resolution,
            duration_secs: order.duration_secs,
        }
    }
}

/// Reference to a produced artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub url: String,
}

/// Trait for rendering agents.
///
/// Session contract: every session returned by `open_session` must be
/// passed to `release` exactly once, whatever happened in between.
#[async_trait]
pub trait RenderingAgent: Send + Sync {
    /// Acquire a browser session. Expensive.
    async fn open_session(&self) -> Result<Session, AgentError>;

    /// Log in to the rendering service.
    async fn authenticate(
        &self,
        session: &Session,
        credentials: &Credentials,
    ) -> Result<(), AgentError>;

    /// Apply generation parameters. Verification is best-effort: the
    /// returned list names parameters that could not be confirmed as
    /// applied. `Err` means the configure call itself failed.
    async fn configure(
        &self,
        session: &Session,
        params: &GenerationParams,
    ) -> Result<Vec<String>, AgentError>;

    /// Enter the prompt and trigger generation. `Ok(false)` means no
    /// started-signal was observed; the caller may poll anyway.
    async fn submit(&self, session: &Session, prompt: &str) -> Result<bool, AgentError>;

    /// One poll probe. Matches the in-flight generation by prompt text.
    async fn check_artifact(
        &self,
        session: &Session,
        match_key: &str,
    ) -> Result<Option<ArtifactRef>, AgentError>;

    /// Liveness ping during long polls.
    async fn keep_alive(&self, session: &Session) -> Result<(), AgentError>;

    /// Drop browser-side caches to keep a long session healthy.
    async fn purge_caches(&self, session: &Session) -> Result<(), AgentError>;

    /// Tear the session down.
    async fn release(&self, session: Session) -> Result<(), AgentError>;
}
