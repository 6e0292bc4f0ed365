use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware, queue, videos, webhook};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Operator/API routes behind the configured authenticator
    let api_routes = Router::new()
        .route("/videos/generate", post(videos::generate))
        .route("/orders/{id}/status", get(videos::order_status))
        .route("/queue/status", get(queue::queue_status))
        .route("/notifications/status", get(queue::notifications_status))
        .route("/config", get(handlers::get_config))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state.clone());

    // The webhook does its own shared-secret check; health and metrics
    // are unauthenticated.
    let public_routes = Router::new()
        .route("/webhooks/payment", post(webhook::payment_webhook))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(public_routes)
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
