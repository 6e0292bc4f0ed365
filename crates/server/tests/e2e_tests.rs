//! End-to-end tests with mocked external dependencies.
//!
//! These tests run the full server stack in-process with mock
//! implementations of the rendering agent and the email transport.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use vidforge_core::config::{AuthConfig, AuthMethod};
use vidforge_core::order::{OrderStatus, OrderStore};

use common::{TestFixture, WEBHOOK_SECRET};

fn webhook_headers<'a>(key: &'a str) -> Vec<(&'a str, String)> {
    vec![
        ("Authorization", format!("Bearer {}", WEBHOOK_SECRET)),
        ("idempotency-key", key.to_string()),
    ]
}

async fn post_webhook(fixture: &TestFixture, body: serde_json::Value, key: &str) -> StatusCode {
    let headers = webhook_headers(key);
    let header_refs: Vec<(&str, &str)> =
        headers.iter().map(|(n, v)| (*n, v.as_str())).collect();
    fixture
        .post_with_headers("/webhooks/payment", body, &header_refs)
        .await
        .status
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_endpoint_redacts_secrets() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);

    let body_text = response.body.to_string();
    assert!(!body_text.contains(WEBHOOK_SECRET));
    assert!(!body_text.contains("render-pass"));
    assert!(!body_text.contains("re_test"));

    assert_eq!(response.body["webhook"]["secret_configured"], true);
    assert_eq!(response.body["generator"]["password_configured"], true);
    assert_eq!(response.body["notifier"]["api_key_configured"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("vidforge_queue_waiting"));
    assert!(body.contains("# HELP"));
}

#[tokio::test]
async fn test_queue_status_empty() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/queue/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["queue_length"], 0);
    assert_eq!(response.body["is_processing"], false);
}

#[tokio::test]
async fn test_notifications_status_empty() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/notifications/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["queue_length"], 0);
    assert_eq!(response.body["sent_total"], 0);
    assert_eq!(response.body["permanent_failures"], 0);
}

// =============================================================================
// API auth
// =============================================================================

#[tokio::test]
async fn test_api_requires_key_when_configured() {
    let fixture = TestFixture::with_auth(AuthConfig {
        method: AuthMethod::ApiKey,
        api_key: Some("operator-key".to_string()),
    });

    let response = fixture.get("/api/v1/queue/status").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = fixture
        .get_with_header("/api/v1/queue/status", "X-API-Key", "operator-key")
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_webhook_bypass_api_auth() {
    let fixture = TestFixture::with_auth(AuthConfig {
        method: AuthMethod::ApiKey,
        api_key: Some("operator-key".to_string()),
    });

    // Health needs no credentials at all
    let response = fixture.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);

    // The webhook uses its own shared secret, not the API key
    fixture.create_order("order-1");
    let status = post_webhook(
        &fixture,
        json!({"type": "payment_started", "paymentId": "order-1"}),
        "evt-1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Webhook endpoint
// =============================================================================

#[tokio::test]
async fn test_webhook_rejects_bad_secret() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_headers(
            "/webhooks/payment",
            json!({"type": "payment_started", "paymentId": "order-1"}),
            &[("Authorization", "Bearer wrong"), ("idempotency-key", "evt-1")],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_rejects_missing_credential() {
    let fixture = TestFixture::new();
    let response = fixture
        .post(
            "/webhooks/payment",
            json!({"type": "payment_started", "paymentId": "order-1"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_acks_immediately() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");

    let headers = webhook_headers("evt-1");
    let header_refs: Vec<(&str, &str)> =
        headers.iter().map(|(n, v)| (*n, v.as_str())).collect();
    let response = fixture
        .post_with_headers(
            "/webhooks/payment",
            json!({"type": "payment_started", "paymentId": "order-1"}),
            &header_refs,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["received"], true);
}

#[tokio::test]
async fn test_webhook_acks_malformed_body() {
    let fixture = TestFixture::new();
    let headers = webhook_headers("evt-1");
    let header_refs: Vec<(&str, &str)> =
        headers.iter().map(|(n, v)| (*n, v.as_str())).collect();

    let response = fixture
        .post_raw("/webhooks/payment", "{not json", &header_refs)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["received"], true);
}

#[tokio::test(start_paused = true)]
async fn test_webhook_payment_completed_drives_order_to_completion() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture
        .agent
        .set_artifact_after_checks(2, "https://cdn.example/video-1.mp4");
    fixture.start_workers();

    let status = post_webhook(
        &fixture,
        json!({
            "type": "payment_completed",
            "paymentId": "order-1",
            "chainId": "8453",
            "txHash": "0xabc"
        }),
        "evt-1",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    fixture.wait_for_settlement("order-1").await;

    let response = fixture.get("/api/v1/orders/order-1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "completed");
    assert_eq!(response.body["videoUrl"], "https://cdn.example/video-1.mp4");
    assert_eq!(response.body["isQueued"], false);
    assert_eq!(response.body["isProcessing"], false);

    // Give the dispatcher a moment to drain
    for _ in 0..100 {
        if fixture.transport.send_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(fixture.transport.sent_order_ids(), vec!["order-1"]);
}

#[tokio::test(start_paused = true)]
async fn test_webhook_duplicate_delivery_is_single_job() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture
        .agent
        .set_artifact_after_checks(1, "https://cdn.example/video-1.mp4");
    fixture.start_workers();

    let event = json!({"type": "payment_completed", "paymentId": "order-1"});
    assert_eq!(post_webhook(&fixture, event.clone(), "evt-1").await, StatusCode::OK);
    assert_eq!(post_webhook(&fixture, event, "evt-1").await, StatusCode::OK);

    fixture.wait_for_settlement("order-1").await;
    assert_eq!(fixture.agent.open_count(), 1);
}

// =============================================================================
// Generate endpoint
// =============================================================================

#[tokio::test]
async fn test_generate_requires_order_id() {
    let fixture = TestFixture::new();
    let response = fixture.post("/api/v1/videos/generate", json!({})).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
}

#[tokio::test]
async fn test_generate_unknown_order() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/videos/generate", json!({"orderId": "nope"}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_enqueues_eligible_order() {
    // Queue not started: the job stays visible in the queue.
    let fixture = TestFixture::new();
    fixture.create_order("order-1");

    let response = fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["status"], "queued");
    assert_eq!(response.body["queuePosition"], 1);
    assert!(response.body["estimatedWaitTime"].is_number());

    let order = fixture.order_store.get("order-1").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Queued);
}

#[tokio::test]
async fn test_generate_twice_reports_in_progress() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");

    fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;
    let response = fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(
        response.body["message"],
        "Video generation already in progress"
    );
    assert_eq!(fixture.queue.status().queue_length, 1);
}

#[tokio::test(start_paused = true)]
async fn test_generate_rejects_completed_order() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture
        .agent
        .set_artifact_after_checks(1, "https://cdn.example/video-1.mp4");
    fixture.start_workers();

    fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;
    fixture.wait_for_settlement("order-1").await;

    let response = fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["status"], "completed");
}

#[tokio::test(start_paused = true)]
async fn test_generate_allows_resubmission_after_failure() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture.agent.fail_submit();
    fixture.start_workers();

    fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;
    fixture.wait_for_settlement("order-1").await;

    let order = fixture.order_store.get("order-1").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);

    // Failed orders stay eligible for explicit re-submission
    let response = fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
}

// =============================================================================
// Status endpoint
// =============================================================================

#[tokio::test]
async fn test_order_status_unknown_order() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/orders/nope/status").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_status_queued() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture
        .post("/api/v1/videos/generate", json!({"orderId": "order-1"}))
        .await;

    let response = fixture.get("/api/v1/orders/order-1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "queued");
    assert_eq!(response.body["isQueued"], true);
    assert_eq!(response.body["queuePosition"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_order_status_failed_includes_error() {
    let fixture = TestFixture::new();
    fixture.create_order("order-1");
    fixture.agent.fail_authenticate();
    fixture.start_workers();

    post_webhook(
        &fixture,
        json!({"type": "payment_completed", "paymentId": "order-1"}),
        "evt-1",
    )
    .await;
    fixture.wait_for_settlement("order-1").await;

    let response = fixture.get("/api/v1/orders/order-1/status").await;
    assert_eq!(response.body["status"], "failed");
    assert!(response.body["error"].as_str().unwrap().contains("login failed"));
}
