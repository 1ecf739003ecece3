//! Run lifecycle: pre-flight, dispatch, drain and final report.
mod lifecycle;
mod report;
mod stop;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::aggregator::{Aggregator, AggregatorHooks};
use crate::distributor::{DispatchContext, WorkDistributor};
use crate::error::AppResult;
use crate::executor::RequestExecutor;
use crate::payload::ResourceCheck;
use crate::progress::ProgressReporter;
use crate::sinks::ReportSink;

pub use lifecycle::{RunLifecycle, RunStatus};
pub use report::{ErrorCount, FinalReport};
pub use stop::{RateLimitStop, StopCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Draining,
    Finished,
}

impl RunState {
    /// The only state reachable from `self`.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Running),
            Self::Running => Some(Self::Draining),
            Self::Draining => Some(Self::Finished),
            Self::Finished => None,
        }
    }
}

/// Why a run stopped before its budget was spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    RateLimited { status: u16 },
    Interrupted,
    /// A dispatch task died; outcomes folded before it still count.
    WorkerFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { status } => write!(f, "rate limited (HTTP {})", status),
            Self::Interrupted => write!(f, "interrupted"),
            Self::WorkerFailed => write!(f, "worker task failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestBudget {
    Fixed(u64),
    /// Keep dispatching until a stop condition or signal ends the run.
    UntilStopped,
}

impl RequestBudget {
    #[must_use]
    pub const fn planned(self) -> Option<u64> {
        match self {
            Self::Fixed(total) => Some(total),
            Self::UntilStopped => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Batch,
    Workers,
}

/// Immutable parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub budget: RequestBudget,
    pub concurrency: usize,
    pub timeout: Duration,
    pub batch_delay: Duration,
    pub worker_count: usize,
    pub mode: DispatchMode,
    pub stop_on_rate_limit: bool,
}

/// Collaborators the controller drives.
pub struct RunParts {
    pub executor: RequestExecutor,
    pub resources: Arc<dyn ResourceCheck>,
    pub progress: Arc<dyn ProgressReporter>,
    pub stop_conditions: Vec<Arc<dyn StopCondition>>,
    pub sinks: Vec<Arc<dyn ReportSink>>,
}

pub struct RunController {
    config: RunConfig,
    executor: Arc<RequestExecutor>,
    resources: Arc<dyn ResourceCheck>,
    progress: Arc<dyn ProgressReporter>,
    stop_conditions: Vec<Arc<dyn StopCondition>>,
    sinks: Vec<Arc<dyn ReportSink>>,
    lifecycle: RunLifecycle,
}

impl RunController {
    #[must_use]
    pub fn new(config: RunConfig, parts: RunParts) -> Self {
        let mut stop_conditions = parts.stop_conditions;
        if config.stop_on_rate_limit {
            stop_conditions.push(Arc::new(RateLimitStop));
        }
        Self {
            config,
            executor: Arc::new(parts.executor),
            resources: parts.resources,
            progress: parts.progress,
            stop_conditions,
            sinks: parts.sinks,
            lifecycle: RunLifecycle::new(),
        }
    }

    /// Handle for requesting a stop from outside the run.
    #[must_use]
    pub fn lifecycle(&self) -> RunLifecycle {
        self.lifecycle.clone()
    }

    /// Runs to completion and hands the report to every sink.
    ///
    /// # Errors
    ///
    /// Returns an error when the distributor cannot be built, the pre-flight
    /// check fails (no report is produced), the run was already executed, or
    /// a sink fails. A failed dispatch task is returned only after the report
    /// built from everything folded so far reached every sink.
    pub async fn run(&self) -> AppResult<FinalReport> {
        let distributor = WorkDistributor::new(&self.config)?;
        if self.lifecycle.state() == RunState::Idle {
            self.resources.check().await?;
        }
        self.lifecycle.transition(RunState::Running)?;

        let started = Instant::now();
        let capacity = self.config.concurrency.max(self.config.worker_count).max(1);
        let (outcomes_tx, outcomes_rx) = mpsc::channel(capacity.saturating_mul(2));
        let aggregator = Aggregator::spawn(
            outcomes_rx,
            self.config.budget.planned(),
            AggregatorHooks {
                progress: self.progress.clone(),
                stop_conditions: self.stop_conditions.clone(),
                lifecycle: self.lifecycle.clone(),
            },
        );

        let dispatched = distributor
            .dispatch(DispatchContext {
                executor: self.executor.clone(),
                outcomes: outcomes_tx,
                lifecycle: self.lifecycle.clone(),
                folded: aggregator.folded(),
            })
            .await;
        self.lifecycle.finish_dispatch()?;

        let stats = aggregator.finish().await?;
        let duration = started.elapsed();
        self.lifecycle.transition(RunState::Finished)?;
        match &dispatched {
            Ok(count) => info!(
                "Run finished: {} dispatched, {} processed in {}ms",
                count,
                stats.processed(),
                duration.as_millis()
            ),
            Err(err) => error!(
                "Dispatch failed after {} processed requests: {}",
                stats.processed(),
                err
            ),
        }

        let report = FinalReport::from_stats(
            &stats,
            duration,
            self.config.budget.planned(),
            self.lifecycle.stop_reason(),
        );
        if let Some(reason) = report.stop_reason {
            warn!("Run stopped early: {}", reason);
        }
        for sink in &self.sinks {
            sink.emit(&report).await?;
        }
        dispatched?;
        Ok(report)
    }
}
