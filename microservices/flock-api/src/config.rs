//! Flock API configuration

use flock_core::{FlockError, Result};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub http_bind: String,
    /// Chat bridge endpoint the dispatcher posts rendered messages to
    pub chat_webhook_url: String,
    pub chat_channel: String,
    pub send_timeout_secs: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_bind: std::env::var("HTTP_BIND").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            chat_webhook_url: std::env::var("CHAT_WEBHOOK_URL")
                .unwrap_or_else(|_| "http://localhost:8800/webhook".to_string()),
            chat_channel: std::env::var("CHAT_CHANNEL").unwrap_or_else(|_| "flock".to_string()),
            send_timeout_secs: std::env::var("CHAT_SEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|e| FlockError::Config(format!("Invalid CHAT_SEND_TIMEOUT_SECS: {e}")))?,
        })
    }
}
