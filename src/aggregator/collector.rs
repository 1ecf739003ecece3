use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::controller::{RunLifecycle, StopCondition};
use crate::error::{AppError, AppResult};
use crate::outcome::Outcome;
use crate::progress::{ProgressReporter, ProgressUpdate, should_report};

use super::RunStats;

/// Collaborators the aggregator calls while folding.
pub struct AggregatorHooks {
    pub progress: Arc<dyn ProgressReporter>,
    pub stop_conditions: Vec<Arc<dyn StopCondition>>,
    pub lifecycle: RunLifecycle,
}

/// Handle to the task that owns [`RunStats`] for the duration of a run.
#[derive(Debug)]
pub struct Aggregator {
    handle: JoinHandle<RunStats>,
    folded: watch::Receiver<u64>,
}

impl Aggregator {
    /// Spawns the single consumer of `outcomes`. It returns the final stats
    /// once every sender is dropped.
    #[must_use]
    pub fn spawn(
        outcomes: mpsc::Receiver<Outcome>,
        total: Option<u64>,
        hooks: AggregatorHooks,
    ) -> Self {
        let (folded_tx, folded) = watch::channel(0_u64);
        let handle = tokio::spawn(collect(outcomes, total, hooks, folded_tx));
        Self { handle, folded }
    }

    /// Number of outcomes folded so far.
    #[must_use]
    pub fn folded(&self) -> watch::Receiver<u64> {
        self.folded.clone()
    }

    /// Waits for the aggregator to drain and returns the frozen stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregator task panicked or was cancelled.
    pub async fn finish(self) -> AppResult<RunStats> {
        self.handle.await.map_err(AppError::from)
    }
}

async fn collect(
    mut outcomes: mpsc::Receiver<Outcome>,
    total: Option<u64>,
    hooks: AggregatorHooks,
    folded_tx: watch::Sender<u64>,
) -> RunStats {
    let mut stats = RunStats::new(Utc::now());

    while let Some(outcome) = outcomes.recv().await {
        stats.fold(&outcome);
        let processed = stats.processed();
        debug!(
            "Folded request {} as {:?} ({} processed)",
            outcome.request_id, outcome.kind, processed
        );

        if should_report(processed, total) {
            hooks.progress.report(ProgressUpdate {
                processed,
                total,
                success: stats.success_count(),
                failure: stats.failure_count(),
            });
        }

        for condition in &hooks.stop_conditions {
            if let Some(reason) = condition.should_stop(&outcome) {
                hooks.lifecycle.request_stop(reason);
            }
        }

        folded_tx.send_replace(processed);
    }

    stats
}
