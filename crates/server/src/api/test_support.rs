//! Shared wiring for in-crate handler tests.

use std::sync::Arc;

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
    Authenticator, NoneAuthenticator, SqliteEventLog, SqliteOrderStore,
};

use crate::state::AppState;

pub fn test_config(auth: AuthConfig) -> Config {
    Config {
        auth,
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        webhook: WebhookConfig {
            secret: "hook-secret".to_string(),
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
    }
}

/// Fully wired state with mock collaborators. Workers are not started;
/// tests that want jobs processed call `start()` on the queue themselves.
pub struct TestState {
    pub state: Arc<AppState>,
    pub order_store: Arc<SqliteOrderStore>,
    pub agent: Arc<MockRenderingAgent>,
    pub transport: Arc<MockNotificationTransport>,
    pub queue: Arc<JobQueue>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

pub fn build(auth: AuthConfig, authenticator: Arc<dyn Authenticator>) -> TestState {
    let config = test_config(auth);

    let order_store = Arc::new(SqliteOrderStore::in_memory().unwrap());
    let event_log = Arc::new(SqliteEventLog::in_memory().unwrap());
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

    let state = Arc::new(AppState::new(
        config,
        authenticator,
        Arc::clone(&order_store) as Arc<dyn OrderStore>,
        ingestor,
        Arc::clone(&queue),
        Arc::clone(&dispatcher),
    ));

    TestState {
        state,
        order_store,
        agent,
        transport,
        queue,
        dispatcher,
    }
}

pub fn state_with_authenticator(
    auth: AuthConfig,
    authenticator: Arc<dyn Authenticator>,
) -> Arc<AppState> {
    build(auth, authenticator).state
}

pub fn default_state() -> TestState {
    build(
        AuthConfig {
            method: vidforge_core::AuthMethod::None,
            api_key: None,
        },
        Arc::new(NoneAuthenticator::new()),
    )
}
