use std::num::NonZeroUsize;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::controller::StopReason;
use crate::error::RunError;

use super::{DispatchContext, partition};

/// Runs one task per contiguous id range; each task sends its requests one
/// after another.
#[derive(Debug, Clone)]
pub struct WorkerDistributor {
    total: u64,
    workers: NonZeroUsize,
}

impl WorkerDistributor {
    #[must_use]
    pub const fn new(total: u64, workers: NonZeroUsize) -> Self {
        Self { total, workers }
    }

    pub(super) async fn dispatch(&self, context: DispatchContext) -> Result<u64, RunError> {
        let mut tasks = JoinSet::new();
        for (worker_id, range) in partition(self.total, self.workers).into_iter().enumerate() {
            let executor = context.executor.clone();
            let outcomes = context.outcomes.clone();
            let lifecycle = context.lifecycle.clone();
            debug!("Worker {} handles {:?}", worker_id, range);

            tasks.spawn(async move {
                let mut dispatched = 0_u64;
                for request_id in range {
                    if !lifecycle.is_dispatch_allowed() {
                        break;
                    }
                    let outcome = executor.execute(request_id).await;
                    dispatched = dispatched.saturating_add(1);
                    outcomes
                        .send(outcome)
                        .await
                        .map_err(|_closed| RunError::AggregatorClosed)?;
                }
                Ok::<u64, RunError>(dispatched)
            });
        }
        let lifecycle = context.lifecycle.clone();
        drop(context);

        let mut dispatched = 0_u64;
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(count)) => dispatched = dispatched.saturating_add(count),
                Ok(Err(err)) => failure = Some(err),
                Err(err) => {
                    error!("Worker task failed: {}", err);
                    lifecycle.request_stop(StopReason::WorkerFailed);
                    failure = Some(RunError::WorkerFailed { source: err });
                }
            }
        }
        failure.map_or(Ok(dispatched), Err)
    }
}
