//! Sampler - periodic CPU sampling and threshold alerting
//!
//! ## State machine
//!
//! The only state is whether the previous sample was above the threshold:
//!
//! ```text
//! sample <= threshold:
//!   was over  → ThresholdEvaluation::BackToNormal (no notification)
//!   otherwise → ThresholdEvaluation::Normal
//!
//! sample > threshold:
//!   was over  → ThresholdEvaluation::Exceeding (no notification)
//!   otherwise → ThresholdEvaluation::StartsToExceed (notify once)
//! ```
//!
//! ## Message flow
//!
//! ```text
//! Timer tick → CpuSource::sample → store.set_sampled_value → evaluate → [spawn dispatch]
//!     ↑
//!     └─── Commands (SampleNow, Shutdown)
//! ```
//!
//! Notifications run as their own tasks so a slow transport never delays the
//! next tick. Shutdown waits for the ones still in flight.

use std::time::Duration;

use anyhow::{Context, Result};
use sysinfo::System;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::mib::registry::{CPU_THRESHOLD, CPU_USAGE, MANAGER_EMAIL};
use crate::mib::{ObjectStore, Oid, Value};
use crate::notify::{NotificationDispatcher, ThresholdAlert};

/// Something that can report the current CPU utilisation in percent
pub trait CpuSource: Send {
    fn sample(&mut self) -> Result<f32>;
}

/// Host CPU utilisation via `sysinfo`
pub struct SystemCpu {
    system: System,
}

impl SystemCpu {
    pub fn new() -> Self {
        let mut system = System::new();
        // usage is computed between two refreshes
        system.refresh_cpu_usage();
        Self { system }
    }
}

impl Default for SystemCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSource for SystemCpu {
    fn sample(&mut self) -> Result<f32> {
        self.system.refresh_cpu_usage();

        let usage = self.system.global_cpu_usage();
        if !usage.is_finite() {
            anyhow::bail!("CPU usage is not a number: {usage}");
        }

        Ok(usage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdEvaluation {
    Normal,
    StartsToExceed,
    Exceeding,
    BackToNormal,
}

impl ThresholdEvaluation {
    pub fn evaluate(sample: i64, threshold: i64, was_over: bool) -> Self {
        match (sample > threshold, was_over) {
            (true, false) => ThresholdEvaluation::StartsToExceed,
            (true, true) => ThresholdEvaluation::Exceeding,
            (false, true) => ThresholdEvaluation::BackToNormal,
            (false, false) => ThresholdEvaluation::Normal,
        }
    }

    pub fn is_over(self) -> bool {
        matches!(
            self,
            ThresholdEvaluation::StartsToExceed | ThresholdEvaluation::Exceeding
        )
    }
}

/// Outcome of one sampling period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    pub usage: i64,
    pub threshold: i64,
    pub evaluation: ThresholdEvaluation,
}

/// One sampling step, independent of any timer
pub struct Sampler {
    store: ObjectStore,
    source: Box<dyn CpuSource>,
    dispatcher: NotificationDispatcher,
    usage_oid: Oid,
    threshold_oid: Oid,
    address_oid: Oid,
    last_over: bool,
    notifications: JoinSet<()>,
}

impl Sampler {
    pub fn new(
        store: ObjectStore,
        source: Box<dyn CpuSource>,
        dispatcher: NotificationDispatcher,
    ) -> Result<Self> {
        let oid_of = |name: &str| {
            store
                .registry()
                .by_name(name)
                .map(|object| object.oid.clone())
                .with_context(|| format!("registry has no '{name}' object"))
        };

        Ok(Self {
            usage_oid: oid_of(CPU_USAGE)?,
            threshold_oid: oid_of(CPU_THRESHOLD)?,
            address_oid: oid_of(MANAGER_EMAIL)?,
            store,
            source,
            dispatcher,
            last_over: false,
            notifications: JoinSet::new(),
        })
    }

    pub fn is_alert_active(&self) -> bool {
        self.last_over
    }

    /// Notifications spawned but not yet finished
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Wait for every spawned notification to finish
    ///
    /// Bounded by the dispatcher's per-transport timeouts.
    pub async fn wait_for_notifications(&mut self) {
        while let Some(result) = self.notifications.join_next().await {
            if let Err(e) = result {
                error!("notification task failed: {e}");
            }
        }
    }

    /// Sample, store, evaluate and notify on a rising edge
    #[instrument(skip(self))]
    pub async fn sample_once(&mut self) -> Result<SampleReport> {
        // no store lock is held while the source runs
        let raw = self.source.sample().context("failed to sample CPU usage")?;
        // halves go to the even neighbour, so 80.5 stays at 80
        let usage = raw.round_ties_even().clamp(0.0, 100.0) as i64;

        self.store
            .set_sampled_value(&self.usage_oid, Value::Integer(usage))
            .await
            .context("failed to store CPU usage")?;

        let threshold = self
            .store
            .lookup_exact(&self.threshold_oid)
            .await
            .and_then(|value| value.as_integer())
            .context("CPU threshold is not an integer")?;

        let evaluation = ThresholdEvaluation::evaluate(usage, threshold, self.last_over);
        self.last_over = evaluation.is_over();

        trace!("cpu {usage}% / threshold {threshold}% -> {evaluation:?}");

        // reap finished notification tasks
        while let Some(result) = self.notifications.try_join_next() {
            if let Err(e) = result {
                error!("notification task failed: {e}");
            }
        }

        match evaluation {
            ThresholdEvaluation::StartsToExceed => {
                let address = self
                    .store
                    .lookup_exact(&self.address_oid)
                    .await
                    .and_then(|value| value.as_text().map(str::to_string))
                    .unwrap_or_default();

                warn!("CPU usage {usage}% exceeds threshold {threshold}%");

                let dispatcher = self.dispatcher.clone();
                let alert = ThresholdAlert {
                    usage,
                    threshold,
                    address,
                };
                self.notifications
                    .spawn(async move { dispatcher.dispatch(&alert).await });
            }
            ThresholdEvaluation::BackToNormal => {
                info!("CPU usage {usage}% back at or below threshold {threshold}%");
            }
            ThresholdEvaluation::Normal | ThresholdEvaluation::Exceeding => {}
        }

        Ok(SampleReport {
            usage,
            threshold,
            evaluation,
        })
    }
}

/// Commands that can be sent to a [`SamplerActor`]
#[derive(Debug)]
pub enum SamplerCommand {
    /// Sample immediately, bypassing the timer
    SampleNow {
        respond_to: oneshot::Sender<Result<SampleReport>>,
    },

    /// Stop the loop; acknowledged once it has exited and pending
    /// notifications have finished
    Shutdown { respond_to: oneshot::Sender<()> },
}

pub struct SamplerActor {
    sampler: Sampler,
    command_rx: mpsc::Receiver<SamplerCommand>,
    period: Duration,
}

impl SamplerActor {
    pub fn new(sampler: Sampler, command_rx: mpsc::Receiver<SamplerCommand>, period: Duration) -> Self {
        Self {
            sampler,
            command_rx,
            period,
        }
    }

    /// Run until a Shutdown command arrives or every handle is dropped
    #[instrument(skip(self), fields(period = ?self.period))]
    pub async fn run(mut self) {
        debug!("starting sampler actor");

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let acknowledge = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sampler.sample_once().await {
                        error!("sampling failed: {e:#}");
                    }
                }

                command = self.command_rx.recv() => match command {
                    Some(SamplerCommand::SampleNow { respond_to }) => {
                        debug!("received SampleNow command");
                        let result = self.sampler.sample_once().await;
                        let _ = respond_to.send(result);
                    }

                    Some(SamplerCommand::Shutdown { respond_to }) => {
                        debug!("received shutdown command");
                        break Some(respond_to);
                    }

                    None => {
                        warn!("command channel closed, shutting down");
                        break None;
                    }
                }
            }
        };

        self.sampler.wait_for_notifications().await;
        debug!("sampler actor stopped");

        if let Some(respond_to) = acknowledge {
            let _ = respond_to.send(());
        }
    }
}

/// Cloneable handle for controlling the sampler task
#[derive(Clone)]
pub struct SamplerHandle {
    sender: mpsc::Sender<SamplerCommand>,
}

impl SamplerHandle {
    pub fn spawn(sampler: Sampler, period: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        tokio::spawn(SamplerActor::new(sampler, cmd_rx, period).run());

        Self { sender: cmd_tx }
    }

    pub async fn sample_now(&self) -> Result<SampleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SamplerCommand::SampleNow { respond_to: tx })
            .await
            .context("failed to send SampleNow command")?;

        rx.await.context("failed to receive sample report")?
    }

    /// Stop the loop and wait until it has exited
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SamplerCommand::Shutdown { respond_to: tx })
            .await
            .context("failed to send Shutdown command")?;

        rx.await.context("sampler exited without acknowledging")
    }
}
