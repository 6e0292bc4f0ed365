//! Video generation and order status endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use vidforge_core::order::{OrderStatus, OrderUpdate};
use vidforge_core::queue::AddOutcome;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_time: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_queued: bool,
    pub is_processing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

fn not_found(order_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Order not found: {}", order_id),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/videos/generate
///
/// Enqueue a generation job for an order, or report that one is already
/// queued or running. Re-submission is how failed orders get retried.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    let order_id = match body.order_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(GenerateResponse {
                    success: false,
                    message: "orderId is required".to_string(),
                    status: None,
                    queue_position: None,
                    estimated_wait_time: None,
                }),
            ))
        }
    };

    let order = state
        .order_store()
        .get(order_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found(order_id))?;

    let queue = state.queue();

    if queue.is_job_active(order_id) {
        return Ok((
            StatusCode::OK,
            Json(GenerateResponse {
                success: true,
                message: "Video generation already in progress".to_string(),
                status: Some(order.status),
                queue_position: queue.position(order_id).map(|p| p + 1),
                estimated_wait_time: None,
            }),
        ));
    }

    if !order.status.is_generation_eligible() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(GenerateResponse {
                success: false,
                message: format!("Order is not eligible for generation (status: {})", order.status),
                status: Some(order.status),
                queue_position: None,
                estimated_wait_time: None,
            }),
        ));
    }

    match queue.add_job(order_id) {
        AddOutcome::Added { position } => {
            state
                .order_store()
                .update(order_id, OrderUpdate::new().with_status(OrderStatus::Queued))
                .map_err(internal_error)?;

            Ok((
                StatusCode::OK,
                Json(GenerateResponse {
                    success: true,
                    message: "Video generation queued".to_string(),
                    status: Some(OrderStatus::Queued),
                    queue_position: Some(position + 1),
                    estimated_wait_time: Some(queue.estimated_wait_secs(position)),
                }),
            ))
        }
        // add_job raced with another submission; same answer either way
        AddOutcome::AlreadyQueued | AddOutcome::AlreadyActive => Ok((
            StatusCode::OK,
            Json(GenerateResponse {
                success: true,
                message: "Video generation already in progress".to_string(),
                status: Some(order.status),
                queue_position: queue.position(order_id).map(|p| p + 1),
                estimated_wait_time: None,
            }),
        )),
    }
}

/// GET /api/v1/orders/{id}/status
///
/// Order status plus queue placement.
pub async fn order_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderStatusResponse>, ApiError> {
    let order = state
        .order_store()
        .get(&order_id)
        .map_err(internal_error)?
        .ok_or_else(|| not_found(&order_id))?;

    let queue = state.queue();
    let position = queue.position(&order_id);

    Ok(Json(OrderStatusResponse {
        status: order.status,
        video_url: order.video_url,
        error: order.error,
        is_queued: position.is_some(),
        is_processing: order.status == OrderStatus::Processing,
        queue_position: position.map(|p| p + 1),
    }))
}
