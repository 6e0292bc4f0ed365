//! Payment webhook endpoint.
//!
//! The sender only ever sees 200 or 401. The acknowledgment goes out before
//! processing runs; downstream failures are recorded, never surfaced, so the
//! payment provider has no reason to redeliver. Safety against the
//! redeliveries that happen anyway comes from the idempotency key.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use vidforge_core::webhook::PaymentEvent;

use crate::state::AppState;

const IDEMPOTENCY_HEADER: &str = "idempotency-key";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /webhooks/payment
///
/// Verify the shared secret, ack, and process the event on a spawned task.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if state.ingestor().verify(token).is_err() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // Body is parsed after auth so a malformed delivery is still acked
    // instead of bouncing back to the provider as a client error.
    let event: PaymentEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("unparseable webhook body, acking anyway: {}", e);
            return Ok(Json(WebhookAck { received: true }));
        }
    };

    let ingestor = Arc::clone(state.ingestor());
    tokio::spawn(async move {
        let outcome = ingestor.process(&event, &idempotency_key);
        info!(
            event_type = %event.event_type,
            payment_id = %event.payment_id,
            ?outcome,
            "webhook processed"
        );
    });

    Ok(Json(WebhookAck { received: true }))
}
