//! Resend email transport.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::NotifierConfig;

use super::template;
use super::{DeliveryId, NotificationError, NotificationJob, NotificationTransport};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Notification transport backed by the Resend email API.
pub struct ResendTransport {
    client: Client,
    config: NotifierConfig,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

impl ResendTransport {
    pub fn new(config: NotifierConfig) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs as u64))
            .build()
            .map_err(|e| NotificationError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            config,
            api_url: RESEND_API_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn map_request_error(e: reqwest::Error) -> NotificationError {
        if e.is_timeout() {
            NotificationError::Timeout(e.to_string())
        } else if e.is_connect() {
            NotificationError::Connection(e.to_string())
        } else {
            NotificationError::Api(e.to_string())
        }
    }
}

#[async_trait]
impl NotificationTransport for ResendTransport {
    async fn send(&self, job: &NotificationJob) -> Result<DeliveryId, NotificationError> {
        let mut body = json!({
            "from": self.config.from,
            "to": [job.recipient],
            "subject": template::video_ready_subject(),
            "html": template::video_ready_html(&job.payload),
        });
        if let Some(reply_to) = &self.config.reply_to {
            body["reply_to"] = json!(reply_to);
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api(format!(
                "send returned {}: {}",
                status, detail
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Api(e.to_string()))?;

        debug!(
            order_id = %job.order_id,
            delivery_id = %parsed.id,
            "notification delivered"
        );
        Ok(DeliveryId(parsed.id))
    }
}
