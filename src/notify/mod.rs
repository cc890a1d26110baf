//! Threshold notifications
//!
//! When the sampler sees a rising edge it hands a [`ThresholdAlert`] to the
//! [`NotificationDispatcher`], which emits two things:
//!
//! 1. a trap-style [`TrapEvent`] through a [`NotificationTransport`]
//! 2. a human-readable [`MailMessage`] through a [`MailTransport`]
//!
//! Both are best effort. Failures are logged and never reach the sampler.

pub mod dispatcher;
pub mod mail;
pub mod smtp;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::mib::Oid;

pub use dispatcher::NotificationDispatcher;
pub use mail::{HttpMailRelay, MailMessage};
pub use smtp::SmtpMailer;
pub use webhook::WebhookNotifier;

/// `sysUpTime.0`
pub const SYS_UPTIME_OID: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 3, 0];

/// `snmpTrapOID.0`
pub const SNMP_TRAP_OID: [u32; 11] = [1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];

/// What the sampler observed when the threshold was crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdAlert {
    pub usage: i64,
    pub threshold: i64,
    /// Notification address (current `managerEmail` value)
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrapVarBind {
    pub oid: Oid,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: serde_json::Value,
}

/// Trap-style event record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrapEvent {
    /// Agent uptime in hundredths of a second
    pub uptime_ticks: u64,

    /// Event type identifier
    pub trap_oid: Oid,

    pub usage: i64,
    pub threshold: i64,
    pub address: String,

    /// The same information as protocol variable bindings
    pub varbinds: Vec<TrapVarBind>,

    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, event: &TrapEvent) -> anyhow::Result<()>;
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}
