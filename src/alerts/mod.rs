use std::time::Duration;

use async_trait::async_trait;

pub mod discord;

pub use discord::DiscordWebhook;

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Webhook rejected the alert with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Alert was not accepted within {0:?}")]
    Timeout(Duration),
}

/// Somewhere a one line text notification can be sent.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Returns once the sink accepted the message. Acceptance does not mean
    /// anyone has read it.
    async fn send(&self, text: &str) -> Result<(), AlertError>;
}
