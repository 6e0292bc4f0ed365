use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidforge_core::{
    create_authenticator, load_config, validate_config, Authenticator, ErrorSink,
    GenerationOrchestrator, JobQueue, JobRunner, NotificationDispatcher, OrderStore,
    RemoteAgentClient, RenderingAgent, ResendTransport, SqliteErrorSink, SqliteEventLog,
    SqliteOrderStore, WebhookIngestor,
};

use vidforge_server::api::create_router;
use vidforge_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("vidforge {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("VIDFORGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Compute config hash so deployments can be told apart in logs
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Config hash: {}", &config_hash[..16]);

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create SQLite stores (orders, processed events, error log)
    let order_store: Arc<dyn OrderStore> = Arc::new(
        SqliteOrderStore::new(&config.database.path).context("Failed to create order store")?,
    );
    info!("Order store initialized");

    let event_log = Arc::new(
        SqliteEventLog::new(&config.database.path).context("Failed to create event log")?,
    );
    info!("Event log initialized");

    let error_sink: Arc<dyn ErrorSink> = Arc::new(
        SqliteErrorSink::new(&config.database.path).context("Failed to create error sink")?,
    );

    // Notification dispatcher with the Resend email transport
    let transport = Arc::new(
        ResendTransport::new(config.notifier.clone())
            .context("Failed to create email transport")?,
    );
    let dispatcher = Arc::new(NotificationDispatcher::new(
        config.notifier.clone(),
        transport,
        Arc::clone(&error_sink),
    ));

    // Rendering agent client and generation orchestrator
    let agent: Arc<dyn RenderingAgent> = Arc::new(
        RemoteAgentClient::new(&config.generator).context("Failed to create agent client")?,
    );
    info!("Rendering agent daemon: {}", config.generator.agent_url);

    let orchestrator: Arc<dyn JobRunner> = Arc::new(GenerationOrchestrator::new(
        config.generator.clone(),
        Arc::clone(&order_store),
        agent,
        Arc::clone(&dispatcher),
        Arc::clone(&error_sink),
    ));

    // Generation job queue, drained by the orchestrator
    let queue = Arc::new(JobQueue::new(config.queue.clone(), orchestrator));

    // Webhook ingestor
    let ingestor = Arc::new(WebhookIngestor::new(
        config.webhook.clone(),
        Arc::clone(&order_store),
        event_log,
        Arc::clone(&queue),
        Arc::clone(&error_sink),
    ));

    // Start background workers
    dispatcher.start();
    info!("Notification dispatcher started");
    queue.start();
    info!("Job queue started");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        order_store,
        ingestor,
        Arc::clone(&queue),
        Arc::clone(&dispatcher),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop workers: queue first so no new notifications are produced,
    // then the dispatcher.
    info!("Server shutting down...");
    queue.stop().await;
    info!("Job queue stopped");
    dispatcher.stop().await;
    info!("Notification dispatcher stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
