//! Work distribution strategies: fixed-size batches or partitioned workers.
mod batch;
mod workers;


use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::controller::{DispatchMode, RequestBudget, RunConfig, RunLifecycle};
use crate::error::RunError;
use crate::executor::RequestExecutor;
use crate::outcome::Outcome;

pub use batch::BatchDistributor;
pub use workers::WorkerDistributor;

/// Shared handles every strategy needs while dispatching.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub executor: Arc<RequestExecutor>,
    pub outcomes: mpsc::Sender<Outcome>,
    pub lifecycle: RunLifecycle,
    /// Count of outcomes the aggregator has folded.
    pub folded: watch::Receiver<u64>,
}

#[derive(Debug, Clone)]
pub enum WorkDistributor {
    Batch(BatchDistributor),
    Workers(WorkerDistributor),
}

impl WorkDistributor {
    /// Picks the strategy for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker or concurrency count is zero, or when
    /// worker mode is combined with an open-ended budget.
    pub fn new(config: &RunConfig) -> Result<Self, RunError> {
        match config.mode {
            DispatchMode::Batch => {
                let concurrency =
                    NonZeroUsize::new(config.concurrency).ok_or(RunError::ConcurrencyZero)?;
                Ok(Self::Batch(BatchDistributor::new(
                    config.budget,
                    concurrency,
                    config.batch_delay,
                )))
            }
            DispatchMode::Workers => {
                let worker_count =
                    NonZeroUsize::new(config.worker_count).ok_or(RunError::WorkerCountZero)?;
                let total = match config.budget {
                    RequestBudget::Fixed(total) => total,
                    RequestBudget::UntilStopped => return Err(RunError::OpenEndedWorkers),
                };
                Ok(Self::Workers(WorkerDistributor::new(total, worker_count)))
            }
        }
    }

    /// Dispatches work until the budget is spent or the run stops, and
    /// returns how many requests were dispatched. Every dispatched request
    /// has completed and been forwarded when this returns.
    ///
    /// # Errors
    ///
    /// Returns an error when the aggregator goes away mid-run.
    pub async fn dispatch(&self, context: DispatchContext) -> Result<u64, RunError> {
        match self {
            Self::Batch(batch) => batch.dispatch(context).await,
            Self::Workers(workers) => workers.dispatch(context).await,
        }
    }
}

/// Splits `[0, total)` into at most `workers` contiguous ranges of
/// `ceil(total / workers)` ids. Empty ranges are dropped.
#[must_use]
pub fn partition(total: u64, workers: NonZeroUsize) -> Vec<Range<u64>> {
    let worker_count = u64::try_from(workers.get()).unwrap_or(u64::MAX);
    let chunk = total.div_ceil(worker_count);
    if chunk == 0 {
        return Vec::new();
    }
    let mut ranges = Vec::with_capacity(workers.get());
    let mut start = 0_u64;
    while start < total {
        let end = start.saturating_add(chunk).min(total);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Size of the batch starting at `next_id`, or zero when the budget is spent.
#[must_use]
pub fn batch_size(budget: RequestBudget, next_id: u64, concurrency: NonZeroUsize) -> u64 {
    let concurrency = u64::try_from(concurrency.get()).unwrap_or(u64::MAX);
    match budget {
        RequestBudget::Fixed(total) => total.saturating_sub(next_id).min(concurrency),
        RequestBudget::UntilStopped => concurrency,
    }
}
