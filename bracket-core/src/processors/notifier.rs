//! Outbound notification of bracket events.

use crate::config::{ConfigStore, NotifierConfig};
use async_trait::async_trait;
use bracket_sdk::objects::EventPayload;
use bracket_sdk::signature::{SIGNATURE_HEADER, SignedObject};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("webhook delivery to {url} failed with status {status}: {body}")]
    DeliveryFailed {
        url: String,
        status: u16,
        body: String,
    },

    /// Payload serialization error
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Something that wants to hear about bracket events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event. An error makes the caller retry the same event.
    async fn notify(&self, payload: &EventPayload) -> Result<(), NotifyError>;
}

/// Posts signed event payloads to every configured webhook URL.
///
/// The configuration is read on every delivery, so a reload takes effect
/// with the next event.
pub struct WebhookNotifier {
    config: ConfigStore<NotifierConfig>,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(config: ConfigStore<NotifierConfig>) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: ConfigStore<NotifierConfig>, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, payload: &EventPayload) -> Result<(), NotifyError> {
        let config = self.config.current().await;
        if !config.is_enabled() {
            return Ok(());
        }

        let signed = SignedObject::new(payload.clone(), &config.secret)?;
        let header = signed.to_header();

        // Every endpoint gets its attempt; the first failure is reported.
        let mut first_error = None;
        for url in &config.webhook_urls {
            let result = self
                .http_client
                .post(url.clone())
                .timeout(config.request_timeout)
                .header("Content-Type", "application/json")
                .header(SIGNATURE_HEADER, &header)
                .body(signed.json.clone())
                .send()
                .await;

            let error = match result {
                Ok(response) if response.status().is_success() => {
                    debug!(%url, "Webhook delivered");
                    continue;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    NotifyError::DeliveryFailed {
                        url: url.to_string(),
                        status,
                        body,
                    }
                }
                Err(e) => NotifyError::Request(e),
            };
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
