//! Alert mail: message rendering and the HTTP relay transport

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

use super::{MailTransport, ThresholdAlert};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,

    /// Plain-text body
    pub text: String,

    /// Rich-text alternative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MailMessage {
    pub fn threshold_alert(
        from: &str,
        alert: &ThresholdAlert,
        agent_oid: &str,
        at: DateTime<Utc>,
    ) -> Self {
        let ThresholdAlert {
            usage,
            threshold,
            address,
        } = alert;
        let when = at.format("%Y-%m-%d %H:%M:%S UTC");

        let text = format!(
            "CPU ALERT\n\
             \n\
             CPU usage has exceeded the configured threshold.\n\
             \n\
             Current CPU usage:   {usage}%\n\
             Configured threshold: {threshold}%\n\
             Time:                {when}\n\
             \n\
             Recommended action: check processes and services that may be\n\
             consuming excessive resources.\n\
             \n\
             --\n\
             mib-agent (agent OID {agent_oid})\n"
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: sans-serif; background-color: #f5f5f5; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background-color: white; border-radius: 10px;">
    <div style="background-color: #ff4757; color: white; padding: 30px; text-align: center;">
      <h1 style="margin: 0;">CPU ALERT</h1>
      <p>CPU usage has exceeded the configured threshold</p>
    </div>
    <div style="padding: 30px;">
      <p><strong>Current CPU usage:</strong> {usage}%</p>
      <p><strong>Configured threshold:</strong> {threshold}%</p>
      <p><strong>Time:</strong> {when}</p>
      <p>Recommended action: check processes and services that may be consuming excessive resources.</p>
    </div>
    <div style="padding: 20px; text-align: center; color: #666; font-size: 12px;">
      mib-agent (agent OID {agent_oid})
    </div>
  </div>
</body>
</html>
"#
        );

        Self {
            from: from.to_string(),
            to: address.clone(),
            subject: format!("CPU alert: {usage}% (threshold: {threshold}%)"),
            text,
            html: Some(html),
        }
    }
}

/// Delivers mail through an HTTP relay accepting a JSON [`MailMessage`]
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpMailRelay {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("failed to build HTTP client")?,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let mut request = self.client.post(&self.url).json(message);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("failed to reach mail relay")?;

        if !response.status().is_success() {
            anyhow::bail!("mail relay failed with status: {}", response.status());
        }

        info!("Successfully sent alert mail");
        Ok(())
    }
}
