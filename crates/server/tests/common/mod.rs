//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling comprehensive E2E testing
//! without a browser agent daemon or an email provider.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use vidforge_core::{
    config::{
        AuthConfig, Config, DatabaseConfig, GeneratorConfig, NotifierConfig, QueueConfig,
        ServerConfig, WebhookConfig,
    },
    error_sink::{ErrorSink, TracingErrorSink},
    event_log::EventLog,
    generator::{GenerationOrchestrator, RenderingAgent},
    notifier::{NotificationDispatcher, NotificationTransport},
    order::OrderStore,
    queue::{JobQueue, JobRunner},
    testing::{MockNotificationTransport, MockRenderingAgent},
    webhook::WebhookIngestor,
    ApiKeyAuthenticator, AuthMethod, Authenticator, NoneAuthenticator, SqliteEventLog,
    SqliteOrderStore,
};

/// Re-export fixtures for test convenience
pub use vidforge_core::testing::fixtures;

/// Shared secret the fixture configures for the payment webhook.
pub const WEBHOOK_SECRET: &str = "hook-secret";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - The rendering agent (MockRenderingAgent)
/// - The email transport (MockNotificationTransport)
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Order store shared with the server
    pub order_store: Arc<SqliteOrderStore>,
    /// Mock rendering agent - script artifacts and failures
    pub agent: Arc<MockRenderingAgent>,
    /// Mock email transport - inspect deliveries
    pub transport: Arc<MockNotificationTransport>,
    /// Generation job queue
    pub queue: Arc<JobQueue>,
    /// Notification dispatcher
    pub dispatcher: Arc<NotificationDispatcher>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default mocks and no API auth.
    pub fn new() -> Self {
        Self::with_auth(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        })
    }

    /// Create a test fixture with the given API auth configuration.
    pub fn with_auth(auth: AuthConfig) -> Self {
        let authenticator: Arc<dyn Authenticator> = match auth.method {
            AuthMethod::None => Arc::new(NoneAuthenticator::new()),
            AuthMethod::ApiKey => Arc::new(ApiKeyAuthenticator::new(
                auth.api_key.clone().expect("api_key required"),
            )),
        };

        let config = Config {
            auth,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            webhook: WebhookConfig {
                secret: WEBHOOK_SECRET.to_string(),
                bounce_overrides_completed: false,
            },
            queue: QueueConfig::default(),
            generator: GeneratorConfig {
                agent_url: "http://localhost:9515".to_string(),
                email: "renderer@vidforge.example".to_string(),
                password: "render-pass".to_string(),
                poll_interval_secs: 1,
                timeout_secs: 10,
                cache_purge_interval: 5,
                request_timeout_secs: 30,
            },
            notifier: NotifierConfig {
                api_key: "re_test".to_string(),
                from: "Vidforge <orders@vidforge.example>".to_string(),
                reply_to: None,
                max_retries: 3,
                retry_delay_ms: 50,
                request_timeout_secs: 30,
            },
        };

        let order_store = Arc::new(SqliteOrderStore::in_memory().expect("order store"));
        let event_log = Arc::new(SqliteEventLog::in_memory().expect("event log"));
        let error_sink = Arc::new(TracingErrorSink);

        let agent = Arc::new(MockRenderingAgent::new());
        let transport = Arc::new(MockNotificationTransport::new());

        let dispatcher = Arc::new(NotificationDispatcher::new(
            config.notifier.clone(),
            Arc::clone(&transport) as Arc<dyn NotificationTransport>,
            Arc::clone(&error_sink) as Arc<dyn ErrorSink>,
        ));

        let orchestrator: Arc<dyn JobRunner> = Arc::new(GenerationOrchestrator::new(
            config.generator.clone(),
            Arc::clone(&order_store) as Arc<dyn OrderStore>,
            Arc::clone(&agent) as Arc<dyn RenderingAgent>,
            Arc::clone(&dispatcher),
            Arc::clone(&error_sink) as Arc<dyn ErrorSink>,
        ));

        let queue = Arc::new(JobQueue::new(config.queue.clone(), orchestrator));

        let ingestor = Arc::new(WebhookIngestor::new(
            config.webhook.clone(),
            Arc::clone(&order_store) as Arc<dyn OrderStore>,
            Arc::clone(&event_log) as Arc<dyn EventLog>,
            Arc::clone(&queue),
            error_sink,
        ));

        let state = Arc::new(vidforge_server::state::AppState::new(
            config,
            authenticator,
            Arc::clone(&order_store) as Arc<dyn OrderStore>,
            ingestor,
            Arc::clone(&queue),
            Arc::clone(&dispatcher),
        ));

        let router = vidforge_server::api::create_router(state);

        Self {
            router,
            order_store,
            agent,
            transport,
            queue,
            dispatcher,
        }
    }

    /// Start the queue and dispatcher workers.
    pub fn start_workers(&self) {
        self.queue.start();
        self.dispatcher.start();
    }

    /// Create an order directly in the store.
    pub fn create_order(&self, id: &str) {
        self.order_store
            .create(fixtures::order_request(id))
            .expect("create order");
    }

    /// Wait until the order reaches a terminal state.
    pub async fn wait_for_settlement(&self, order_id: &str) {
        for _ in 0..200 {
            let order = self
                .order_store
                .get(order_id)
                .expect("get order")
                .expect("order exists");
            if order.status.is_terminal() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("order {} did not settle", order_id);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::builder().method("GET").uri(path), None)
            .await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a GET request with a header.
    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        self.request(
            Request::builder().method("GET").uri(path).header(name, value),
            None,
        )
        .await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(Request::builder().method("POST").uri(path), Some(body))
            .await
    }

    /// Send a POST request with JSON body and extra headers.
    pub async fn post_with_headers(
        &self,
        path: &str,
        body: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder, Some(body)).await
    }

    /// Send a POST request with a raw string body (for malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    async fn request(
        &self,
        mut builder: axum::http::request::Builder,
        body: Option<Value>,
    ) -> TestResponse {
        let body = if let Some(json_body) = body {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
