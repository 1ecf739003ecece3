use crate::outcome::Outcome;

use super::StopReason;

const TOO_MANY_REQUESTS: u16 = 429;

/// Decides, per folded outcome, whether the run should stop early.
pub trait StopCondition: Send + Sync {
    fn should_stop(&self, outcome: &Outcome) -> Option<StopReason>;
}

/// Stops on the first rate-limited response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitStop;

impl StopCondition for RateLimitStop {
    fn should_stop(&self, outcome: &Outcome) -> Option<StopReason> {
        match outcome.status_code {
            Some(TOO_MANY_REQUESTS) => Some(StopReason::RateLimited {
                status: TOO_MANY_REQUESTS,
            }),
            Some(_) | None => None,
        }
    }
}
