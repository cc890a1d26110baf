//! Helper functions for integration tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mib_agent::{
    AccessGate, ObjectStore, Oid, Registry,
    mib::registry::{CPU_THRESHOLD, CPU_USAGE, MANAGER, MANAGER_EMAIL},
    notify::{MailMessage, MailTransport, NotificationDispatcher, NotificationTransport, TrapEvent},
    sampler::CpuSource,
};

pub const BASE_OID: &str = "1.3.6.1.4.1.28308.1";
pub const NOTIFICATION_OID: &str = "1.3.6.1.4.1.28308.2.1";

pub fn base() -> Oid {
    BASE_OID.parse().unwrap()
}

pub fn registry() -> Registry {
    Registry::scalar_agent(&base()).unwrap()
}

pub fn gate() -> AccessGate {
    AccessGate::new(["public", "public-area"], ["private"])
}

pub fn memory_store() -> ObjectStore {
    ObjectStore::in_memory(registry(), gate())
}

pub fn manager_oid() -> Oid {
    base().child(&[1, 0])
}

pub fn email_oid() -> Oid {
    base().child(&[2, 0])
}

pub fn usage_oid() -> Oid {
    base().child(&[3, 0])
}

pub fn threshold_oid() -> Oid {
    base().child(&[4, 0])
}

/// Names in registry order, for sanity checks against the helpers above
pub fn object_names() -> [&'static str; 4] {
    [MANAGER, MANAGER_EMAIL, CPU_USAGE, CPU_THRESHOLD]
}

/// CPU source replaying a fixed script of samples
pub struct ScriptedCpu(pub VecDeque<f32>);

impl ScriptedCpu {
    pub fn boxed(samples: &[f32]) -> Box<dyn CpuSource> {
        Box::new(Self(samples.iter().copied().collect()))
    }
}

impl CpuSource for ScriptedCpu {
    fn sample(&mut self) -> anyhow::Result<f32> {
        self.0
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no more samples"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<TrapEvent>>,
}

#[async_trait]
impl NotificationTransport for RecordingNotifier {
    async fn send(&self, event: &TrapEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub messages: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct Recorders {
    pub notifier: Arc<RecordingNotifier>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn recording_dispatcher(registry: &Registry) -> (NotificationDispatcher, Recorders) {
    let notifier = Arc::new(RecordingNotifier::default());
    let mailer = Arc::new(RecordingMailer::default());

    let dispatcher = NotificationDispatcher::new(NOTIFICATION_OID.parse().unwrap(), registry)
        .unwrap()
        .with_notifier(notifier.clone(), Duration::from_secs(1))
        .with_mailer(mailer.clone(), "agent@example.org", Duration::from_secs(1));

    (dispatcher, Recorders { notifier, mailer })
}
