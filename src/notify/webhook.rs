//! JSON webhook carrying trap events

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use super::{NotificationTransport, TrapEvent};

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("failed to build HTTP client")?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationTransport for WebhookNotifier {
    #[instrument(skip(self, event), fields(url = %self.url))]
    async fn send(&self, event: &TrapEvent) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .context("failed to send trap event")?;

        if !response.status().is_success() {
            anyhow::bail!("trap webhook failed with status: {}", response.status());
        }

        info!("Successfully sent trap event");
        Ok(())
    }
}
