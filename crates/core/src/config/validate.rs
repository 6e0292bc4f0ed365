use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration beyond what serde enforces:
/// - server port is not 0
/// - webhook secret is non-empty
/// - api_key auth actually carries a key
/// - queue concurrency is at least 1
/// - generation timeout exceeds the poll interval
/// - notifier sender address looks like an address
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.webhook.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "webhook.secret cannot be empty".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_ref().is_none_or(|k| k.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key is required when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.queue.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "queue.max_concurrent must be at least 1".to_string(),
        ));
    }

    if config.generator.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "generator.poll_interval_secs must be at least 1".to_string(),
        ));
    }

    if config.generator.timeout_secs <= config.generator.poll_interval_secs {
        return Err(ConfigError::ValidationError(
            "generator.timeout_secs must exceed generator.poll_interval_secs".to_string(),
        ));
    }

    if !config.notifier.from.contains('@') {
        return Err(ConfigError::ValidationError(
            "notifier.from does not look like an email address".to_string(),
        ));
    }

    Ok(())
}
