//! Runs a single request from payload construction to a classified outcome.
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::http::RequestSender;
use crate::outcome::{Outcome, RawResult, classify};
use crate::payload::PayloadBuilder;

/// Executes one request per call. Never fails; every failure is an outcome.
#[derive(Clone)]
pub struct RequestExecutor {
    builder: Arc<dyn PayloadBuilder>,
    sender: Arc<dyn RequestSender>,
    timeout: Duration,
}

impl RequestExecutor {
    #[must_use]
    pub fn new(
        builder: Arc<dyn PayloadBuilder>,
        sender: Arc<dyn RequestSender>,
        timeout: Duration,
    ) -> Self {
        Self {
            builder,
            sender,
            timeout,
        }
    }

    /// Builds, sends and classifies request `request_id`.
    ///
    /// Elapsed time covers dispatch through completion or failure; payload
    /// construction is not measured.
    pub async fn execute(&self, request_id: u64) -> Outcome {
        let payload = match self.builder.build(request_id).await {
            Ok(payload) => payload,
            Err(err) => return Outcome::setup_error(request_id, &err),
        };

        let start = Instant::now();
        let attempt = if self.timeout.is_zero() {
            self.sender.send(payload, self.timeout).await
        } else {
            match tokio::time::timeout(self.timeout, self.sender.send(payload, self.timeout)).await
            {
                Ok(attempt) => attempt,
                Err(_elapsed) => Ok(RawResult::Aborted),
            }
        };
        let elapsed = start.elapsed();

        match attempt {
            Ok(raw) => classify(request_id, raw, elapsed),
            Err(err) => Outcome::setup_error(request_id, &err),
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
