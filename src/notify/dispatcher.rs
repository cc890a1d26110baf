use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::mib::registry::{CPU_THRESHOLD, CPU_USAGE, MANAGER_EMAIL};
use crate::mib::{Oid, Registry};

use super::{
    HttpMailRelay, MailMessage, MailTransport, NotificationTransport, SNMP_TRAP_OID,
    SYS_UPTIME_OID, SmtpMailer, ThresholdAlert, TrapEvent, TrapVarBind, WebhookNotifier,
};

const DEFAULT_TRAP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAIL_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn NotificationTransport>>,
    mailer: Option<Arc<dyn MailTransport>>,
    notification_oid: Oid,
    agent_oid: Oid,
    usage_oid: Oid,
    threshold_oid: Oid,
    address_oid: Oid,
    from: String,
    trap_timeout: Duration,
    mail_timeout: Duration,
    started: Instant,
}

impl NotificationDispatcher {
    /// Dispatcher without transports; events are only logged
    pub fn new(notification_oid: Oid, registry: &Registry) -> anyhow::Result<Self> {
        let oid_of = |name: &str| {
            registry
                .by_name(name)
                .map(|object| object.oid.clone())
                .with_context(|| format!("registry has no '{name}' object"))
        };

        Ok(Self {
            notifier: None,
            mailer: None,
            notification_oid,
            agent_oid: registry.base().clone(),
            usage_oid: oid_of(CPU_USAGE)?,
            threshold_oid: oid_of(CPU_THRESHOLD)?,
            address_oid: oid_of(MANAGER_EMAIL)?,
            from: String::from("mib-agent@localhost"),
            trap_timeout: DEFAULT_TRAP_TIMEOUT,
            mail_timeout: DEFAULT_MAIL_TIMEOUT,
            started: Instant::now(),
        })
    }

    pub fn with_notifier(
        mut self,
        notifier: Arc<dyn NotificationTransport>,
        timeout: Duration,
    ) -> Self {
        self.notifier = Some(notifier);
        self.trap_timeout = timeout;
        self
    }

    pub fn with_mailer(
        mut self,
        mailer: Arc<dyn MailTransport>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        self.mailer = Some(mailer);
        self.from = from.into();
        self.mail_timeout = timeout;
        self
    }

    /// Wire up the transports named in the configuration
    pub fn from_config(config: &Config, registry: &Registry) -> anyhow::Result<Self> {
        let mut dispatcher = Self::new(config.mib.notification_oid.clone(), registry)?;

        if let Some(trap) = &config.trap {
            let timeout = Duration::from_secs(trap.timeout_secs);
            let notifier = WebhookNotifier::new(trap.url.clone(), timeout)?;
            info!("trap events go to {}", notifier.url());
            dispatcher = dispatcher.with_notifier(Arc::new(notifier), timeout);
        }

        if let Some(smtp) = &config.smtp {
            if config.mail.is_some() {
                warn!("both smtp and mail are configured, using smtp");
            }
            let timeout = Duration::from_secs(smtp.timeout_secs);
            let mailer = SmtpMailer::new(smtp.host.clone(), smtp.port, timeout);
            info!("alert mail goes to SMTP relay {}", mailer.endpoint());
            dispatcher = dispatcher.with_mailer(Arc::new(mailer), smtp.from.clone(), timeout);
        } else if let Some(mail) = &config.mail {
            let timeout = Duration::from_secs(mail.timeout_secs);
            let token = crate::util::get_mail_token().or_else(|| mail.token.clone());
            let relay = HttpMailRelay::new(mail.url.clone(), token, timeout)?;
            dispatcher = dispatcher.with_mailer(Arc::new(relay), mail.from.clone(), timeout);
        }

        Ok(dispatcher)
    }

    pub fn has_transports(&self) -> bool {
        self.notifier.is_some() || self.mailer.is_some()
    }

    pub fn build_event(&self, alert: &ThresholdAlert) -> TrapEvent {
        let uptime_ticks = (self.started.elapsed().as_millis() / 10) as u64;

        let varbinds = vec![
            TrapVarBind {
                oid: Oid::new(SYS_UPTIME_OID),
                kind: "TimeTicks",
                value: json!(uptime_ticks),
            },
            TrapVarBind {
                oid: Oid::new(SNMP_TRAP_OID),
                kind: "ObjectIdentifier",
                value: json!(self.notification_oid.to_string()),
            },
            TrapVarBind {
                oid: self.usage_oid.clone(),
                kind: "Integer32",
                value: json!(alert.usage),
            },
            TrapVarBind {
                oid: self.threshold_oid.clone(),
                kind: "Integer32",
                value: json!(alert.threshold),
            },
            TrapVarBind {
                oid: self.address_oid.clone(),
                kind: "DisplayString",
                value: json!(alert.address),
            },
        ];

        TrapEvent {
            uptime_ticks,
            trap_oid: self.notification_oid.clone(),
            usage: alert.usage,
            threshold: alert.threshold,
            address: alert.address.clone(),
            varbinds,
            timestamp: Utc::now(),
        }
    }

    pub fn build_mail(&self, alert: &ThresholdAlert) -> MailMessage {
        MailMessage::threshold_alert(&self.from, alert, &self.agent_oid.to_string(), Utc::now())
    }

    /// Send the trap event and the mail
    ///
    /// Never fails. Each transport is bounded by its own timeout and every
    /// outcome is logged.
    #[instrument(skip(self), fields(usage = alert.usage, threshold = alert.threshold))]
    pub async fn dispatch(&self, alert: &ThresholdAlert) {
        if !self.has_transports() {
            warn!(
                "CPU usage {}% exceeds threshold {}% (no transports configured, notifying {})",
                alert.usage, alert.threshold, alert.address
            );
            return;
        }

        let event = self.build_event(alert);
        let message = self.build_mail(alert);

        let trap = async {
            let Some(notifier) = &self.notifier else {
                return;
            };
            match tokio::time::timeout(self.trap_timeout, notifier.send(&event)).await {
                Ok(Ok(())) => info!("trap event delivered"),
                Ok(Err(e)) => error!("failed to deliver trap event: {e:#}"),
                Err(_) => error!("trap event delivery timed out after {:?}", self.trap_timeout),
            }
        };

        let mail = async {
            let Some(mailer) = &self.mailer else {
                return;
            };
            match tokio::time::timeout(self.mail_timeout, mailer.send(&message)).await {
                Ok(Ok(())) => info!("alert mail sent to {}", message.to),
                Ok(Err(e)) => error!("failed to send alert mail to {}: {e:#}", message.to),
                Err(_) => error!("alert mail delivery timed out after {:?}", self.mail_timeout),
            }
        };

        tokio::join!(trap, mail);
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("notification_oid", &self.notification_oid)
            .field("notifier", &self.notifier.is_some())
            .field("mailer", &self.mailer.is_some())
            .finish()
    }
}
