//! Chat transport
//!
//! The channel is advisory: a failed send is the caller's problem to log and
//! drop, never to retry or surface to a submitting agent.

use async_trait::async_trait;
use flock_core::{FlockError, Result};

/// "Send text to channel" primitive over the external chat bot
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, message: &str) -> Result<()>;
}

/// Webhook-based transport posting rendered messages to the chat bridge
pub struct WebhookTransport {
    client: reqwest::Client,
    webhook_url: String,
    channel: String,
}

impl WebhookTransport {
    pub fn new(webhook_url: &str, channel: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.to_string(),
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl ChatTransport for WebhookTransport {
    async fn send(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({
                "channel": self.channel,
                "text": message,
            }))
            .send()
            .await
            .map_err(|e| FlockError::Unavailable(format!("chat webhook: {e}")))?;

        if !response.status().is_success() {
            return Err(FlockError::Unavailable(format!(
                "chat webhook returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
