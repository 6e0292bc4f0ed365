//! API surface authentication.
//!
//! The payment webhook has its own shared-secret check; this module covers
//! the operator/API endpoints (generation, status, config).

mod api_key;
mod none;

pub use api_key::ApiKeyAuthenticator;
pub use none::NoneAuthenticator;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{AuthConfig, AuthMethod};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Request information for authentication. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
}

/// Authenticated identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}

/// Factory function to create authenticator from config
pub fn create_authenticator(config: &AuthConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config.method {
        AuthMethod::None => Ok(Box::new(NoneAuthenticator::new())),
        AuthMethod::ApiKey => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                AuthError::ConfigurationError(
                    "api_key must be set when using api_key auth method".to_string(),
                )
            })?;
            Ok(Box::new(ApiKeyAuthenticator::new(api_key)))
        }
    }
}
