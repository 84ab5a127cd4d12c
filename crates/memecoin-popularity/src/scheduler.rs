//! Background write-back of dirty counters.
//!
//! The scheduler owns the pending set. It starts a reconciliation pass when
//! the set reaches `batch_size` ids or when `sync_interval` elapses,
//! whichever comes first. At most one pass runs at a time; ids marked while
//! a pass is in flight wait for the next one.

use crate::config::{ConfigError, SyncConfig};
use crate::dirty::{DirtyReceiver, DirtySignal, PendingSet};
use crate::error::SyncError;
use crate::reconciler::{BatchReconciler, ReconcileReport};
use memecoin_core::{MemeCoinId, ScoreCache, ScoreStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

type PassOutput = (HashSet<MemeCoinId>, Result<ReconcileReport, SyncError>);

/// Totals reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Passes that opened a transaction.
    pub passes: u64,
    /// Counters persisted across all passes.
    pub reconciled: usize,
    /// Passes that ended in a transaction-level failure.
    pub failed_passes: u64,
}

/// Handle to a running [`SyncScheduler`].
#[derive(Debug)]
pub struct SyncHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<SyncSummary>,
}

impl SyncHandle {
    /// Stops the scheduler after a final pass over everything still pending.
    pub async fn shutdown(self) -> Result<SyncSummary, JoinError> {
        // The task may already have stopped on its own.
        let _ = self.shutdown.send(());
        self.task.await
    }

    /// Whether the scheduler task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct SyncScheduler<C, S> {
    reconciler: Arc<BatchReconciler<C, S>>,
    signals: DirtyReceiver,
    batch_size: usize,
    sync_interval: Duration,
    pending: PendingSet,
    /// Ids removed from the cache while the current pass was in flight.
    forgotten: HashSet<MemeCoinId>,
    in_flight: Option<JoinHandle<PassOutput>>,
    /// Set after a failed pass so a full set waits for the next tick instead of retrying at once.
    hold_until_tick: bool,
    summary: SyncSummary,
}

impl<C, S> SyncScheduler<C, S>
where
    C: ScoreCache,
    S: ScoreStore,
{
    /// Creates a scheduler for `config`.
    ///
    /// Rejects a configuration that fails [`SyncConfig::validate`], such as a
    /// zero sync interval.
    pub fn new(
        reconciler: Arc<BatchReconciler<C, S>>,
        signals: DirtyReceiver,
        config: &SyncConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reconciler,
            signals,
            batch_size: config.batch_size,
            sync_interval: config.sync_interval,
            pending: PendingSet::default(),
            forgotten: HashSet::new(),
            in_flight: None,
            hold_until_tick: false,
            summary: SyncSummary::default(),
        })
    }

    /// Runs the scheduler on the tokio runtime.
    ///
    /// The task stops when [`SyncHandle::shutdown`] is called or when every
    /// [`DirtySender`](crate::DirtySender) has been dropped. Dropping the
    /// handle detaches the task.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(shutdown_rx));
        SyncHandle { shutdown, task }
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> SyncSummary {
        let mut ticker = interval_at(Instant::now() + self.sync_interval, self.sync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut detached = false;

        info!(
            batch_size = self.batch_size,
            sync_interval = ?self.sync_interval,
            "Sync scheduler started"
        );

        loop {
            tokio::select! {
                signal = self.signals.recv() => {
                    let Some(signal) = signal else {
                        debug!("All dirty signal producers dropped");
                        break;
                    };
                    self.absorb(signal);
                    self.dispatch_if_full();
                }
                _ = ticker.tick() => {
                    self.hold_until_tick = false;
                    self.dispatch("interval");
                }
                joined = join_in_flight(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.settle(joined);
                    self.dispatch_if_full();
                }
                result = &mut shutdown, if !detached => {
                    match result {
                        Ok(()) => break,
                        Err(_) => {
                            debug!("Sync handle dropped, scheduler detached");
                            detached = true;
                        }
                    }
                }
            }
        }

        self.drain().await
    }

    fn absorb(&mut self, signal: DirtySignal) {
        match signal {
            DirtySignal::Forgotten(id) if self.in_flight.is_some() => {
                self.forgotten.insert(id);
            }
            DirtySignal::Marked(id) => {
                self.forgotten.remove(&id);
            }
            DirtySignal::Forgotten(_) => {}
        }
        self.pending.absorb(signal);
    }

    fn dispatch_if_full(&mut self) {
        if !self.hold_until_tick && self.pending.len() >= self.batch_size {
            self.dispatch("threshold");
        }
    }

    fn dispatch(&mut self, trigger: &'static str) {
        if self.in_flight.is_some() || self.pending.is_empty() {
            return;
        }

        let batch = self.pending.take();
        self.forgotten.clear();
        debug!(trigger, batch_size = batch.len(), "Starting reconciliation pass");

        let reconciler = Arc::clone(&self.reconciler);
        self.in_flight = Some(tokio::spawn(async move {
            let result = reconciler.reconcile(&batch).await;
            (batch, result)
        }));
    }

    fn settle(&mut self, joined: Result<PassOutput, JoinError>) {
        match joined {
            Ok((_, Ok(report))) => {
                self.summary.passes += 1;
                self.summary.reconciled += report.applied.len();
            }
            Ok((batch, Err(e))) => {
                self.summary.passes += 1;
                self.summary.failed_passes += 1;
                self.hold_until_tick = true;

                let mut requeued = 0;
                for id in batch {
                    if !self.forgotten.contains(&id) && self.pending.mark(id) {
                        requeued += 1;
                    }
                }
                warn!(error = %e, requeued, "Reconciliation pass failed, ids stay pending");
            }
            Err(e) => {
                self.summary.failed_passes += 1;
                error!(error = %e, "Reconciliation task did not complete");
            }
        }
        self.forgotten.clear();
    }

    async fn drain(mut self) -> SyncSummary {
        if let Some(pass) = self.in_flight.take() {
            let joined = pass.await;
            self.settle(joined);
        }
        while let Some(signal) = self.signals.try_recv() {
            self.absorb(signal);
        }

        if !self.pending.is_empty() {
            let batch = self.pending.take();
            self.summary.passes += 1;
            match self.reconciler.reconcile(&batch).await {
                Ok(report) => self.summary.reconciled += report.applied.len(),
                Err(e) => {
                    self.summary.failed_passes += 1;
                    error!(
                        error = %e,
                        unsynced = batch.len(),
                        "Final reconciliation failed, cached counters were not persisted"
                    );
                }
            }
        }

        info!(
            passes = self.summary.passes,
            reconciled = self.summary.reconciled,
            failed_passes = self.summary.failed_passes,
            "Sync scheduler stopped"
        );
        self.summary
    }
}

async fn join_in_flight(
    in_flight: &mut Option<JoinHandle<PassOutput>>,
) -> Result<PassOutput, JoinError> {
    match in_flight {
        Some(pass) => pass.await,
        None => std::future::pending().await,
    }
}
