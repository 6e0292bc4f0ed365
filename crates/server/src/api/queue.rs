//! Queue and notification status endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use vidforge_core::notifier::DispatcherStatus;
use vidforge_core::queue::QueueStatus;

use crate::state::AppState;

/// GET /api/v1/queue/status
pub async fn queue_status(State(state): State<Arc<AppState>>) -> Json<QueueStatus> {
    Json(state.queue().status())
}

/// GET /api/v1/notifications/status
pub async fn notifications_status(State(state): State<Arc<AppState>>) -> Json<DispatcherStatus> {
    Json(state.dispatcher().status())
}
