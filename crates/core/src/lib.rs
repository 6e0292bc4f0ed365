pub mod auth;
pub mod config;
pub mod error_sink;
pub mod event_log;
pub mod generator;
pub mod metrics;
pub mod notifier;
pub mod order;
pub mod queue;
pub mod testing;
pub mod webhook;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use error_sink::{ErrorContext, ErrorSink, SqliteErrorSink, TracingErrorSink};
pub use event_log::{EventLog, EventLogError, EventRecord, SqliteEventLog};
pub use generator::{
    GenerationError, GenerationOrchestrator, RemoteAgentClient, RenderingAgent,
};
pub use notifier::{
    NotificationDispatcher, NotificationError, NotificationJob, NotificationPayload,
    NotificationTransport, ResendTransport,
};
pub use order::{
    CreateOrderRequest, Order, OrderError, OrderStatus, OrderStore, OrderUpdate, PaymentStatus,
    SqliteOrderStore,
};
pub use queue::{AddOutcome, JobQueue, JobRunner, QueueStatus};
pub use webhook::{IngestOutcome, PaymentEvent, WebhookError, WebhookIngestor};
