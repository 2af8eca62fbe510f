use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::{AlertError, AlertSink};

#[derive(Debug, Serialize)]
struct DiscordPayload<'a> {
    content: &'a str,
}

/// Posts alerts to a Discord channel webhook.
pub struct DiscordWebhook {
    client: Client,
    webhook_url: String,
}

impl DiscordWebhook {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url,
        })
    }
}

#[async_trait]
impl AlertSink for DiscordWebhook {
    async fn send(&self, text: &str) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&DiscordPayload { content: text })
            .send()
            .await?;

        // Discord answers a plain webhook execution with 204 and no body
        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => {
                log::debug!("Discord webhook answered {status}");
                Err(AlertError::Status(status))
            }
        }
    }
}
