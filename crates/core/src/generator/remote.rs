//! HTTP rendering agent client.
//!
//! Talks JSON to the browser-automation daemon that drives the rendering
//! service UI. All DOM heuristics (selectors, click strategies, option
//! verification) live in the daemon; this client only speaks its API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::GeneratorConfig;

use super::{AgentError, ArtifactRef, Credentials, GenerationParams, RenderingAgent, Session};

/// Rendering agent over the daemon's HTTP API.
pub struct RemoteAgentClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OpenSessionResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct ConfigureResponse {
    #[serde(default)]
    unverified: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    started: bool,
}

#[derive(Debug, Deserialize)]
struct ArtifactResponse {
    url: Option<String>,
}

impl RemoteAgentClient {
    /// Create a new client against the configured agent daemon.
    pub fn new(config: &GeneratorConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs as u64))
            .build()
            .map_err(|e| AgentError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.agent_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_request_error(e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(e.to_string())
        } else if e.is_connect() {
            AgentError::Connection(e.to_string())
        } else {
            AgentError::Http(e.to_string())
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, AgentError> {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Protocol(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::Protocol(e.to_string()))
    }

    async fn post_empty(&self, path: &str) -> Result<(), AgentError> {
        let response = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Protocol(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RenderingAgent for RemoteAgentClient {
    async fn open_session(&self) -> Result<Session, AgentError> {
        let response: OpenSessionResponse = self.post_json("/sessions", json!({})).await?;
        debug!(session = %response.session_id, "opened agent session");
        Ok(Session::new(response.session_id))
    }

    async fn authenticate(
        &self,
        session: &Session,
        credentials: &Credentials,
    ) -> Result<(), AgentError> {
        let path = format!("/sessions/{}/login", session.id);
        self.post_json::<serde_json::Value>(
            &path,
            json!({
                "email": credentials.email,
                "password": credentials.password,
            }),
        )
        .await?;
        Ok(())
    }

    async fn configure(
        &self,
        session: &Session,
        params: &GenerationParams,
    ) -> Result<Vec<String>, AgentError> {
        let path = format!("/sessions/{}/configure", session.id);
        let response: ConfigureResponse = self
            .post_json(
                &path,
                json!({
                    "aspect_ratio": params.aspect_ratio,
                    "resolution": params.resolution,
                    "duration_secs": params.duration_secs,
                }),
            )
            .await?;
        Ok(response.unverified)
    }

    async fn submit(&self, session: &Session, prompt: &str) -> Result<bool, AgentError> {
        let path = format!("/sessions/{}/submit", session.id);
        let response: SubmitResponse = self.post_json(&path, json!({ "prompt": prompt })).await?;
        Ok(response.started)
    }

    async fn check_artifact(
        &self,
        session: &Session,
        match_key: &str,
    ) -> Result<Option<ArtifactRef>, AgentError> {
        let path = format!("/sessions/{}/artifact", session.id);
        let response: ArtifactResponse = self
            .post_json(&path, json!({ "match_key": match_key }))
            .await?;
        Ok(response.url.map(|url| ArtifactRef { url }))
    }

    async fn keep_alive(&self, session: &Session) -> Result<(), AgentError> {
        self.post_empty(&format!("/sessions/{}/keepalive", session.id))
            .await
    }

    async fn purge_caches(&self, session: &Session) -> Result<(), AgentError> {
        self.post_empty(&format!("/sessions/{}/purge", session.id))
            .await
    }

    async fn release(&self, session: Session) -> Result<(), AgentError> {
        let response = self
            .client
            .delete(self.url(&format!("/sessions/{}", session.id)))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(AgentError::Protocol(format!(
                "session teardown returned {}",
                response.status()
            )));
        }

        debug!(session = %session.id, "released agent session");
        Ok(())
    }
}
