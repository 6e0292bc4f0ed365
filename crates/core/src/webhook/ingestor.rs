//! Webhook ingestion pipeline.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::config::WebhookConfig;
use crate::error_sink::{ErrorContext, ErrorSink};
use crate::event_log::{EventLog, EventRecord};
use crate::metrics;
use crate::order::{OrderError, OrderStatus, OrderStore, OrderUpdate, PaymentStatus};
use crate::queue::JobQueue;

use super::{IngestOutcome, PaymentEvent, PaymentEventType, WebhookError};

/// Ingests payment webhooks: verify, deduplicate, dispatch.
pub struct WebhookIngestor {
    config: WebhookConfig,
    order_store: Arc<dyn OrderStore>,
    event_log: Arc<dyn EventLog>,
    queue: Arc<JobQueue>,
    error_sink: Arc<dyn ErrorSink>,
}

impl WebhookIngestor {
    pub fn new(
        config: WebhookConfig,
        order_store: Arc<dyn OrderStore>,
        event_log: Arc<dyn EventLog>,
        queue: Arc<JobQueue>,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            config,
            order_store,
            event_log,
            queue,
            error_sink,
        }
    }

    /// Check the shared secret presented by the sender.
    pub fn verify(&self, token: Option<&str>) -> Result<(), WebhookError> {
        let token = token.ok_or(WebhookError::Authentication)?;
        if constant_time_eq(token.as_bytes(), self.config.secret.as_bytes()) {
            Ok(())
        } else {
            Err(WebhookError::Authentication)
        }
    }

    /// Process an already-authenticated event.
    ///
    /// The idempotency key is committed to the event log before any state
    /// change, so a crash mid-dispatch means at-most-once, never a replay.
    /// Downstream failures are recorded and swallowed; the caller has
    /// already acknowledged the delivery.
    pub fn process(&self, event: &PaymentEvent, idempotency_key: &str) -> IngestOutcome {
        if idempotency_key.is_empty() {
            warn!(
                payment_id = %event.payment_id,
                "webhook without idempotency key, skipping"
            );
            return IngestOutcome::Ignored;
        }

        let record = EventRecord::new(event.event_type.clone(), event.payment_id.clone());
        match self.event_log.insert_if_absent(idempotency_key, &record) {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    idempotency_key,
                    payment_id = %event.payment_id,
                    "duplicate webhook, skipping"
                );
                metrics::WEBHOOK_EVENTS
                    .with_label_values(&[&event.event_type, "duplicate"])
                    .inc();
                return IngestOutcome::Duplicate;
            }
            Err(e) => {
                // Without the dedup gate we cannot safely act on the event
                self.report(&event.payment_id, &format!("event log error: {}", e));
                return IngestOutcome::Ignored;
            }
        }

        let outcome = match event.kind() {
            PaymentEventType::PaymentStarted => self.on_payment_started(event),
            PaymentEventType::PaymentCompleted => self.on_payment_completed(event),
            PaymentEventType::PaymentBounced => self.on_payment_bounced(event),
            PaymentEventType::Unknown(kind) => {
                warn!(payment_id = %event.payment_id, kind, "unknown webhook event type");
                IngestOutcome::Ignored
            }
        };

        let result_label = match &outcome {
            IngestOutcome::Processed => "processed",
            IngestOutcome::Duplicate => "duplicate",
            IngestOutcome::Ignored => "ignored",
        };
        metrics::WEBHOOK_EVENTS
            .with_label_values(&[&event.event_type, result_label])
            .inc();

        outcome
    }

    fn on_payment_started(&self, event: &PaymentEvent) -> IngestOutcome {
        let order = match self.order_store.get(&event.payment_id) {
            Ok(Some(order)) => order,
            Ok(None) => return self.missing_order(event),
            Err(e) => return self.store_failure(event, e),
        };

        // Completion is sticky
        if order.payment_status == PaymentStatus::PaymentCompleted {
            info!(
                payment_id = %event.payment_id,
                "payment already completed, ignoring payment_started"
            );
            return IngestOutcome::Ignored;
        }

        let update = OrderUpdate::new().with_payment_status(PaymentStatus::PaymentStarted);
        match self.order_store.update(&event.payment_id, update) {
            Ok(_) => {
                info!(payment_id = %event.payment_id, "payment started");
                IngestOutcome::Processed
            }
            Err(e) => self.store_failure(event, e),
        }
    }

    fn on_payment_completed(&self, event: &PaymentEvent) -> IngestOutcome {
        let update = OrderUpdate {
            payment_status: Some(PaymentStatus::PaymentCompleted),
            status: Some(OrderStatus::PendingGeneration),
            payment_chain_id: event.chain_id.clone(),
            payment_tx_hash: event.tx_hash.clone(),
            ..Default::default()
        };

        if let Err(e) = self.order_store.update(&event.payment_id, update) {
            return match e {
                OrderError::NotFound(_) => self.missing_order(event),
                other => self.store_failure(event, other),
            };
        }

        info!(payment_id = %event.payment_id, "payment completed, queueing generation");

        let outcome = self.queue.add_job(&event.payment_id);
        if outcome.is_added() {
            let update = OrderUpdate::new().with_status(OrderStatus::Queued);
            if let Err(e) = self.order_store.update(&event.payment_id, update) {
                return self.store_failure(event, e);
            }
        } else {
            info!(payment_id = %event.payment_id, ?outcome, "generation already pending");
        }

        IngestOutcome::Processed
    }

    fn on_payment_bounced(&self, event: &PaymentEvent) -> IngestOutcome {
        let order = match self.order_store.get(&event.payment_id) {
            Ok(Some(order)) => order,
            Ok(None) => return self.missing_order(event),
            Err(e) => return self.store_failure(event, e),
        };

        if order.payment_status == PaymentStatus::PaymentCompleted
            && !self.config.bounce_overrides_completed
        {
            warn!(
                payment_id = %event.payment_id,
                "payment_bounced after completion, ignoring by policy"
            );
            return IngestOutcome::Ignored;
        }

        let update = OrderUpdate::new()
            .with_payment_status(PaymentStatus::PaymentBounced)
            .with_status(OrderStatus::Failed)
            .with_error("Payment bounced");
        match self.order_store.update(&event.payment_id, update) {
            Ok(_) => {
                warn!(payment_id = %event.payment_id, "payment bounced");
                IngestOutcome::Processed
            }
            Err(e) => self.store_failure(event, e),
        }
    }

    fn missing_order(&self, event: &PaymentEvent) -> IngestOutcome {
        warn!(
            payment_id = %event.payment_id,
            event_type = %event.event_type,
            "webhook for unknown order"
        );
        self.error_sink.record(
            "webhook for unknown order",
            ErrorContext::new("webhook")
                .with_order_id(event.payment_id.clone())
                .with_details(json!({ "event_type": event.event_type })),
        );
        IngestOutcome::Ignored
    }

    fn store_failure(&self, event: &PaymentEvent, error: OrderError) -> IngestOutcome {
        self.report(
            &event.payment_id,
            &format!("webhook dispatch failed: {}", error),
        );

        // Best effort: surface the failure on the order itself
        let update = OrderUpdate::new()
            .with_status(OrderStatus::Failed)
            .with_error(error.to_string());
        if let Err(e) = self.order_store.update(&event.payment_id, update) {
            warn!(payment_id = %event.payment_id, "could not mark order failed: {}", e);
        }

        IngestOutcome::Ignored
    }

    fn report(&self, order_id: &str, message: &str) {
        warn!(order_id, "{}", message);
        self.error_sink
            .record(message, ErrorContext::new("webhook").with_order_id(order_id));
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
