//! Outbound notification delivery.
//!
//! The core hands a fully drafted message to a `NotificationChannel` and only
//! cares whether the send succeeded. Transport details live behind the trait.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay rejected message (status {status}): {message}")]
    Relay { status: u16, message: String },

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts each message as JSON to a relay (mail gateway, chat bot) that owns
/// the actual transport.
#[derive(Clone)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        let address = address.trim();
        if address.is_empty() || !address.contains('@') {
            return Err(DeliveryError::Rejected(format!(
                "'{address}' is not a deliverable address"
            )));
        }

        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload {
                to: address,
                subject,
                body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Relay {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        debug!("Relay accepted message for {address}");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them. Used when no relay is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), DeliveryError> {
        info!(
            to = address,
            subject,
            body_len = body.len(),
            "Notification (log channel)"
        );
        debug!("{body}");
        Ok(())
    }
}
