use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::RunError;

use super::{RunState, StopReason};

/// Current run state plus the first stop reason, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub state: RunState,
    pub stop_reason: Option<StopReason>,
}

/// Owner of the run state machine.
///
/// Every state change goes through [`RunLifecycle::transition`] or
/// [`RunLifecycle::request_stop`]. Clones share one watch channel.
#[derive(Debug, Clone)]
pub struct RunLifecycle {
    status: Arc<watch::Sender<RunStatus>>,
}

impl Default for RunLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLifecycle {
    #[must_use]
    pub fn new() -> Self {
        let (status, _) = watch::channel(RunStatus {
            state: RunState::Idle,
            stop_reason: None,
        });
        Self {
            status: Arc::new(status),
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.status.borrow().state
    }

    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.status.borrow().stop_reason
    }

    /// New work may only be dispatched while the run is `Running`.
    #[must_use]
    pub fn is_dispatch_allowed(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Moves the run to `to`.
    ///
    /// # Errors
    ///
    /// Returns `RunError::InvalidTransition` unless `to` directly follows the
    /// current state.
    pub fn transition(&self, to: RunState) -> Result<RunState, RunError> {
        let mut result = Err(RunError::InvalidTransition {
            from: RunState::Idle,
            to,
        });
        self.status.send_if_modified(|status| {
            let from = status.state;
            if from.next() == Some(to) {
                status.state = to;
                result = Ok(from);
                true
            } else {
                result = Err(RunError::InvalidTransition { from, to });
                false
            }
        });
        if let Ok(from) = result {
            info!("Run state {:?} -> {:?}", from, to);
        }
        result
    }

    /// Requests an early stop. Only a `Running` run reacts; the first reason
    /// is kept.
    pub fn request_stop(&self, reason: StopReason) -> bool {
        let stopped = self.status.send_if_modified(|status| {
            if status.state != RunState::Running {
                return false;
            }
            status.state = RunState::Draining;
            status.stop_reason = Some(reason);
            true
        });
        if stopped {
            warn!("Stopping run: {}. Waiting for in-flight requests.", reason);
        }
        stopped
    }

    /// Called once the distributor returns. A no-op when a stop already moved
    /// the run to `Draining`.
    ///
    /// # Errors
    ///
    /// Returns an error when the run is neither `Running` nor `Draining`.
    pub fn finish_dispatch(&self) -> Result<(), RunError> {
        match self.state() {
            RunState::Draining => Ok(()),
            RunState::Running | RunState::Idle | RunState::Finished => {
                self.transition(RunState::Draining).map(|_| ())
            }
        }
    }
}
