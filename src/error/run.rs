use std::path::PathBuf;

use thiserror::Error;

use crate::controller::RunState;

/// Pre-flight failures. A run that hits one of these never starts.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Cannot access test file '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Test file '{path}' is not a regular file.")]
    NotAFile { path: PathBuf },
    #[error("{message}")]
    Other { message: String },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Aborted before start: {0}")]
    Resource(#[from] ResourceError),
    #[error("Worker count must be >= 1.")]
    WorkerCountZero,
    #[error("Concurrency must be >= 1.")]
    ConcurrencyZero,
    #[error("Worker-partition mode needs a fixed request count.")]
    OpenEndedWorkers,
    #[error("Invalid run state transition {from:?} -> {to:?}.")]
    InvalidTransition { from: RunState, to: RunState },
    #[error("Worker task failed: {source}")]
    WorkerFailed {
        #[source]
        source: tokio::task::JoinError,
    },
    #[error("Result aggregator stopped before the run finished.")]
    AggregatorClosed,
}
