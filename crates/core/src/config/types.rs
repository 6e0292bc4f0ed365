use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    pub generator: GeneratorConfig,
    pub notifier: NotifierConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for the API surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API key, required when method = "api_key".
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("vidforge.db")
}

/// Payment webhook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Shared secret presented by the payment provider as a bearer token.
    pub secret: String,
    /// Whether a payment_bounced event may override an already completed
    /// payment. Off by default: a completed payment stays completed.
    #[serde(default)]
    pub bounce_overrides_completed: bool,
}

/// Generation job queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum generation jobs in flight at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Used to estimate wait time from queue position.
    #[serde(default = "default_avg_processing_secs")]
    pub avg_processing_secs: u64,
    /// Automatic re-enqueues of a failed job. 0 = explicit re-submission only.
    #[serde(default)]
    pub max_auto_retries: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            avg_processing_secs: default_avg_processing_secs(),
            max_auto_retries: 0,
        }
    }
}

fn default_max_concurrent() -> usize {
    1
}

fn default_avg_processing_secs() -> u64 {
    600
}

/// Rendering agent and generation protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Browser-automation agent daemon URL (e.g., "http://localhost:9515").
    pub agent_url: String,
    /// Account used to log in to the rendering service.
    pub email: String,
    pub password: String,
    /// Seconds between artifact polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Total poll budget before the generation is declared timed out.
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    /// Purge browser caches every N polls.
    #[serde(default = "default_cache_purge_interval")]
    pub cache_purge_interval: u32,
    /// Per-request timeout against the agent daemon (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_generation_timeout_secs() -> u64 {
    2400
}

fn default_cache_purge_interval() -> u32 {
    5
}

fn default_request_timeout() -> u32 {
    30
}

/// Customer notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// Resend API key.
    pub api_key: String,
    /// Sender address, e.g. "Vidforge <orders@vidforge.example>".
    pub from: String,
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Delivery attempts per notification before it is recorded as a
    /// permanent failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before a failed notification is retried.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-request timeout against the email API (default: 30).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u32,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    5000
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub webhook: SanitizedWebhookConfig,
    pub queue: QueueConfig,
    pub generator: SanitizedGeneratorConfig,
    pub notifier: SanitizedNotifierConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWebhookConfig {
    pub secret_configured: bool,
    pub bounce_overrides_completed: bool,
}

/// Sanitized generator config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub agent_url: String,
    pub email: String,
    pub password_configured: bool,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
    pub cache_purge_interval: u32,
}

/// Sanitized notifier config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotifierConfig {
    pub from: String,
    pub api_key_configured: bool,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            webhook: SanitizedWebhookConfig {
                secret_configured: !config.webhook.secret.is_empty(),
                bounce_overrides_completed: config.webhook.bounce_overrides_completed,
            },
            queue: config.queue.clone(),
            generator: SanitizedGeneratorConfig {
                agent_url: config.generator.agent_url.clone(),
                email: config.generator.email.clone(),
                password_configured: !config.generator.password.is_empty(),
                poll_interval_secs: config.generator.poll_interval_secs,
                timeout_secs: config.generator.timeout_secs,
                cache_purge_interval: config.generator.cache_purge_interval,
            },
            notifier: SanitizedNotifierConfig {
                from: config.notifier.from.clone(),
                api_key_configured: !config.notifier.api_key.is_empty(),
                max_retries: config.notifier.max_retries,
                retry_delay_ms: config.notifier.retry_delay_ms,
            },
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        auth: AuthConfig {
            method: AuthMethod::None,
            api_key: None,
        },
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        webhook: WebhookConfig {
            secret: "whsec-test".to_string(),
            bounce_overrides_completed: false,
        },
        queue: QueueConfig::default(),
        generator: GeneratorConfig {
            agent_url: "http://localhost:9515".to_string(),
            email: "renderer@example.com".to_string(),
            password: "hunter2".to_string(),
            poll_interval_secs: 10,
            timeout_secs: 2400,
            cache_purge_interval: 5,
            request_timeout_secs: 30,
        },
        notifier: NotifierConfig {
            api_key: "re_test".to_string(),
            from: "Vidforge <orders@vidforge.example>".to_string(),
            reply_to: None,
            max_retries: 3,
            retry_delay_ms: 5000,
            request_timeout_secs: 30,
        },
    }
}
