//! Video generation.
//!
//! The [`RenderingAgent`] trait abstracts the browser-automation daemon
//! that drives the rendering service; [`GenerationOrchestrator`] runs the
//! authenticate / configure / submit / poll protocol for queued orders.

mod agent;
mod orchestrator;
mod remote;
mod types;

pub use agent::{
    AgentError, ArtifactRef, Credentials, GenerationParams, RenderingAgent, Session,
};
pub use orchestrator::GenerationOrchestrator;
pub use remote::RemoteAgentClient;
pub use types::GenerationError;
