use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::constants::RECONCILE_INTERVAL_SECS;
use crate::jobs::reconciliation::ReconciliationJobs;

/// Drives both reconciliation sweeps on a fixed cadence.
///
/// A tick that overruns the interval is skipped rather than queued, so a
/// slow upstream never piles up overlapping sweeps.
pub struct JobScheduler {
    jobs: Arc<ReconciliationJobs>,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(jobs: Arc<ReconciliationJobs>) -> Self {
        Self::with_interval(jobs, Duration::from_secs(RECONCILE_INTERVAL_SECS))
    }

    pub fn with_interval(jobs: Arc<ReconciliationJobs>, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            jobs,
            interval,
            shutdown_tx,
            shutdown_rx,
            handle: Mutex::new(None),
        }
    }

    /// Spawns the sweep loop. The first tick fires immediately; when nothing
    /// is tracked both sweeps return without doing work. A second call while
    /// the loop is running does nothing.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return;
        }

        let jobs = self.jobs.clone();
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_rx.clone();
        *handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        info!("Reconciliation scheduler stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        jobs.refresh_sweep().await;
                        jobs.profit_sweep().await;
                    }
                }
            }
        }));
        info!(
            "Reconciliation scheduler started, sweeping every {:?}",
            self.interval
        );
    }

    /// Signals the loop to stop and waits for any in-flight tick to finish.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.lock().await.take() {
            if let Err(join_error) = handle.await {
                error!("Reconciliation scheduler task failed: {}", join_error);
            }
        }
    }
}
