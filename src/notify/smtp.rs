//! Plain SMTP delivery of alert mail
//!
//! Meant for a local relay (a smarthost or a development catcher on port
//! 1025). The connection is unencrypted and unauthenticated; relays that need
//! TLS or credentials sit behind [`super::HttpMailRelay`] instead.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, header::ContentType};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, instrument};

use super::{MailMessage, MailTransport};

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        let host = host.into();
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host.as_str())
            .port(port)
            .timeout(Some(timeout))
            .build();

        Self {
            transport,
            host,
            port,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Render a [`MailMessage`] as a MIME message, with the HTML body as an
/// alternative part when present
pub fn build_email(message: &MailMessage) -> anyhow::Result<Message> {
    let from: Mailbox = message
        .from
        .parse()
        .with_context(|| format!("invalid sender address '{}'", message.from))?;
    let to: Mailbox = message
        .to
        .parse()
        .with_context(|| format!("invalid recipient address '{}'", message.to))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone());

    let email = match &message.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.text.clone()),
    };

    email.context("failed to build alert mail")
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[instrument(skip(self, message), fields(to = %message.to, relay = %self.endpoint()))]
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let email = build_email(message)?;

        self.transport
            .send(email)
            .await
            .with_context(|| format!("SMTP delivery via {} failed", self.endpoint()))?;

        info!("Successfully sent alert mail");
        Ok(())
    }
}
