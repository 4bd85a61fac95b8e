//! Notifier configuration.

use std::time::Duration;
use url::Url;

/// Where and how event webhooks are delivered.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Endpoints receiving every event. Empty disables delivery.
    pub webhook_urls: Vec<Url>,
    /// HMAC secret for the `Bracket-Signature` header.
    pub secret: Box<[u8]>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl NotifierConfig {
    pub fn new(webhook_urls: Vec<Url>, secret: Box<[u8]>) -> Self {
        Self {
            webhook_urls,
            secret,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.webhook_urls.is_empty()
    }
}
