use std::num::NonZeroUsize;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tracing::debug;

use crate::controller::RequestBudget;
use crate::error::RunError;

use super::{DispatchContext, batch_size};

/// Dispatches `concurrency` requests at a time and waits for each batch to
/// be folded before starting the next.
#[derive(Debug, Clone)]
pub struct BatchDistributor {
    budget: RequestBudget,
    concurrency: NonZeroUsize,
    delay: Duration,
}

impl BatchDistributor {
    #[must_use]
    pub const fn new(budget: RequestBudget, concurrency: NonZeroUsize, delay: Duration) -> Self {
        Self {
            budget,
            concurrency,
            delay,
        }
    }

    pub(super) async fn dispatch(&self, context: DispatchContext) -> Result<u64, RunError> {
        let DispatchContext {
            executor,
            outcomes,
            lifecycle,
            mut folded,
        } = context;
        let mut next_id = 0_u64;

        while lifecycle.is_dispatch_allowed() {
            let size = batch_size(self.budget, next_id, self.concurrency);
            if size == 0 {
                break;
            }
            let end = next_id.saturating_add(size);
            debug!("Dispatching batch {}..{}", next_id, end);

            let mut in_flight: FuturesUnordered<_> = (next_id..end)
                .map(|request_id| {
                    let executor = executor.clone();
                    async move { executor.execute(request_id).await }
                })
                .collect();
            next_id = end;

            while let Some(outcome) = in_flight.next().await {
                outcomes
                    .send(outcome)
                    .await
                    .map_err(|_closed| RunError::AggregatorClosed)?;
            }
            folded
                .wait_for(|count| *count >= end)
                .await
                .map_err(|_closed| RunError::AggregatorClosed)?;

            let more = batch_size(self.budget, next_id, self.concurrency) > 0;
            if more && !self.delay.is_zero() && lifecycle.is_dispatch_allowed() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(next_id)
    }
}
