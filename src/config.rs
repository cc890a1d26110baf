use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::trace;

use crate::mib::Oid;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Where the object values are persisted
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default)]
    pub mib: MibConfig,

    #[serde(default)]
    pub communities: Communities,

    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Trap-style event delivery (optional - events are only logged without it)
    pub trap: Option<TrapConfig>,

    /// Alert mail delivery through an HTTP relay (optional)
    pub mail: Option<MailConfig>,

    /// Alert mail delivery over plain SMTP (optional, preferred over `mail`)
    pub smtp: Option<SmtpConfig>,

    #[serde(default)]
    pub api: ApiSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            mib: MibConfig::default(),
            communities: Communities::default(),
            sampler: SamplerConfig::default(),
            trap: None,
            mail: None,
            smtp: None,
            api: ApiSettings::default(),
        }
    }
}

/// Numeric tree the agent exposes
#[derive(Debug, Clone, serde::Deserialize)]
pub struct MibConfig {
    #[serde(default = "default_base_oid")]
    pub base_oid: Oid,

    /// Event type identifier carried by threshold notifications
    #[serde(default = "default_notification_oid")]
    pub notification_oid: Oid,
}

impl Default for MibConfig {
    fn default() -> Self {
        Self {
            base_oid: default_base_oid(),
            notification_oid: default_notification_oid(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Communities {
    #[serde(default = "default_read_only")]
    pub read_only: Vec<String>,

    #[serde(default = "default_read_write")]
    pub read_write: Vec<String>,
}

impl Default for Communities {
    fn default() -> Self {
        Self {
            read_only: default_read_only(),
            read_write: default_read_write(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl SamplerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TrapConfig {
    pub url: String,
    #[serde(default = "default_trap_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MailConfig {
    /// Mail relay endpoint
    pub url: String,
    #[serde(default = "default_mail_from")]
    pub from: String,
    /// Bearer credential for the relay; `AGENT_MAIL_TOKEN` takes precedence
    pub token: Option<String>,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_mail_from")]
    pub from: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from("mib_state.json")
}

fn default_base_oid() -> Oid {
    Oid::new(vec![1, 3, 6, 1, 4, 1, 28308, 1])
}

fn default_notification_oid() -> Oid {
    Oid::new(vec![1, 3, 6, 1, 4, 1, 28308, 2, 1])
}

fn default_read_only() -> Vec<String> {
    vec![String::from("public")]
}

fn default_read_write() -> Vec<String> {
    vec![String::from("private")]
}

fn default_interval() -> u64 {
    5
}

fn default_trap_timeout() -> u64 {
    5
}

fn default_mail_timeout() -> u64 {
    10
}

fn default_smtp_host() -> String {
    String::from("localhost")
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_mail_from() -> String {
    String::from("mib-agent@localhost")
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((crate::util::get_addr(), crate::util::get_default_port()))
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path}"))?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
