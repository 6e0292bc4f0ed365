use std::sync::Arc;

use vidforge_core::{
    notifier::NotificationDispatcher, queue::JobQueue, webhook::WebhookIngestor, Authenticator,
    Config, OrderStore, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    order_store: Arc<dyn OrderStore>,
    ingestor: Arc<WebhookIngestor>,
    queue: Arc<JobQueue>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        order_store: Arc<dyn OrderStore>,
        ingestor: Arc<WebhookIngestor>,
        queue: Arc<JobQueue>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            config,
            authenticator,
            order_store,
            ingestor,
            queue,
            dispatcher,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn order_store(&self) -> &dyn OrderStore {
        self.order_store.as_ref()
    }

    pub fn ingestor(&self) -> &Arc<WebhookIngestor> {
        &self.ingestor
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn avg_processing_secs(&self) -> u64 {
        self.config.queue.avg_processing_secs
    }
}
