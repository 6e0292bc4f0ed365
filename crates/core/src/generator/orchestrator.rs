//! Generation orchestration.
//!
//! Drives one queued order through the rendering protocol:
//! authenticate, configure, submit, then poll until an artifact appears or
//! the poll budget runs out. The browser session is released exactly once
//! on every exit path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::config::GeneratorConfig;
use crate::error_sink::{ErrorContext, ErrorSink};
use crate::metrics;
use crate::notifier::{NotificationDispatcher, NotificationJob, NotificationPayload};
use crate::order::{Order, OrderStatus, OrderStore, OrderUpdate};
use crate::queue::JobRunner;

use super::{
    ArtifactRef, Credentials, GenerationError, GenerationParams, RenderingAgent, Session,
};

/// Runs the generation protocol for queued orders.
pub struct GenerationOrchestrator {
    config: GeneratorConfig,
    order_store: Arc<dyn OrderStore>,
    agent: Arc<dyn RenderingAgent>,
    notifier: Arc<NotificationDispatcher>,
    error_sink: Arc<dyn ErrorSink>,
}

impl GenerationOrchestrator {
    pub fn new(
        config: GeneratorConfig,
        order_store: Arc<dyn OrderStore>,
        agent: Arc<dyn RenderingAgent>,
        notifier: Arc<NotificationDispatcher>,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            config,
            order_store,
            agent,
            notifier,
            error_sink,
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.config.email.clone(),
            password: self.config.password.clone(),
        }
    }

    async fn process(&self, order_id: &str) -> Result<(), GenerationError> {
        let order = self
            .order_store
            .get(order_id)?
            .ok_or_else(|| GenerationError::OrderNotFound(order_id.to_string()))?;

        let started_at = Utc::now();
        self.order_store.update(
            order_id,
            OrderUpdate::new().with_status(OrderStatus::Processing),
        )?;
        info!(order_id, prompt = %order.prompt, "generation started");

        let session = self.agent.open_session().await?;

        // Everything between open and release runs in drive(); release
        // happens exactly once, whatever drive() returned.
        let outcome = self.drive(&session, &order).await;
        if let Err(e) = self.agent.release(session).await {
            warn!(order_id, "failed to release agent session: {}", e);
        }
        let artifact = outcome?;

        let completed_at = Utc::now();
        let processing_time_secs = (completed_at - started_at).num_seconds();

        self.order_store.update(
            order_id,
            OrderUpdate {
                status: Some(OrderStatus::Completed),
                video_url: Some(artifact.url.clone()),
                completed_at: Some(completed_at),
                processing_time_secs: Some(processing_time_secs),
                ..Default::default()
            },
        )?;
        info!(
            order_id,
            processing_time_secs,
            video_url = %artifact.url,
            "generation completed"
        );

        self.notifier.enqueue(NotificationJob::new(
            order.email.clone(),
            order_id,
            NotificationPayload {
                video_url: artifact.url,
                prompt: order.prompt.clone(),
                resolution: order.resolution,
                duration_secs: order.duration_secs,
            },
        ));

        Ok(())
    }

    /// Protocol phases that need a live session.
    async fn drive(
        &self,
        session: &Session,
        order: &Order,
    ) -> Result<ArtifactRef, GenerationError> {
        self.agent
            .authenticate(session, &self.credentials())
            .await
            .map_err(|e| GenerationError::AuthFailure(e.to_string()))?;

        let params = GenerationParams::from_order(order);
        match self.agent.configure(session, &params).await {
            Ok(unverified) => {
                for param in unverified {
                    warn!(
                        order_id = %order.id,
                        param,
                        "generation parameter could not be verified, continuing"
                    );
                }
            }
            Err(e) => return Err(GenerationError::ConfigFailure(e.to_string())),
        }

        match self.agent.submit(session, &order.prompt).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(order_id = %order.id, "no generation start signal observed, polling anyway");
            }
            Err(e) => return Err(GenerationError::SubmitFailure(e.to_string())),
        }

        self.poll(session, order).await
    }

    /// Poll for the artifact until it shows up or the budget is spent.
    /// Probe errors are transient; only the deadline ends the loop.
    async fn poll(&self, session: &Session, order: &Order) -> Result<ArtifactRef, GenerationError> {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.timeout_secs);
        let mut attempts: u32 = 0;

        loop {
            tokio::time::sleep(interval).await;

            if tokio::time::Instant::now() >= deadline {
                warn!(order_id = %order.id, attempts, "generation poll budget exhausted");
                return Err(GenerationError::PollTimeout(self.config.timeout_secs));
            }
            attempts += 1;

            match self.agent.check_artifact(session, &order.prompt).await {
                Ok(Some(artifact)) => {
                    info!(order_id = %order.id, attempts, "artifact found");
                    return Ok(artifact);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(order_id = %order.id, attempts, "artifact probe failed: {}", e);
                }
            }

            if let Err(e) = self.agent.keep_alive(session).await {
                warn!(order_id = %order.id, "keep-alive failed: {}", e);
            }

            if self.config.cache_purge_interval > 0
                && attempts % self.config.cache_purge_interval == 0
            {
                if let Err(e) = self.agent.purge_caches(session).await {
                    warn!(order_id = %order.id, "cache purge failed: {}", e);
                }
            }
        }
    }

    fn record_failure(&self, order_id: &str, error: &GenerationError) {
        // A missing order has nothing to mark failed
        if !matches!(error, GenerationError::OrderNotFound(_)) {
            let update = OrderUpdate::new()
                .with_status(OrderStatus::Failed)
                .with_error(error.to_string());
            if let Err(store_err) = self.order_store.update(order_id, update) {
                warn!(order_id, "failed to mark order failed: {}", store_err);
            }
        }

        self.error_sink.record(
            &error.to_string(),
            ErrorContext::new("generator").with_order_id(order_id),
        );
    }
}

#[async_trait]
impl JobRunner for GenerationOrchestrator {
    async fn run(&self, order_id: &str) -> Result<(), GenerationError> {
        let timer = std::time::Instant::now();
        let result = self.process(order_id).await;

        let label = match &result {
            Ok(()) => "success",
            Err(GenerationError::PollTimeout(_)) => "timeout",
            Err(_) => "failed",
        };
        metrics::GENERATIONS_TOTAL.with_label_values(&[label]).inc();
        metrics::GENERATION_DURATION
            .with_label_values(&[label])
            .observe(timer.elapsed().as_secs_f64());

        if let Err(e) = &result {
            self.record_failure(order_id, e);
        }
        result
    }
}
