//! Progress observations emitted while outcomes are folded.
use tracing::info;

const PROGRESS_STEP: u64 = 10;

/// Snapshot handed to the progress reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub processed: u64,
    /// `None` for open-ended runs.
    pub total: Option<u64>,
    pub success: u64,
    pub failure: u64,
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Whether `processed` crosses a reporting threshold.
#[must_use]
pub fn should_report(processed: u64, total: Option<u64>) -> bool {
    if processed == 0 {
        return false;
    }
    processed.checked_rem(PROGRESS_STEP) == Some(0) || total == Some(processed)
}

/// Reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, update: ProgressUpdate) {
        info!("{}", format_progress(&update));
    }
}

#[must_use]
pub fn format_progress(update: &ProgressUpdate) -> String {
    match update.total {
        Some(total) if total > 0 => {
            let percent_x10 = update
                .processed
                .saturating_mul(1000)
                .checked_div(total)
                .unwrap_or(0);
            format!(
                "Progress: {}.{}% ({}/{}) - Success: {}, Failed: {}",
                percent_x10 / 10,
                percent_x10 % 10,
                update.processed,
                total,
                update.success,
                update.failure
            )
        }
        Some(_) | None => format!(
            "Progress: {} processed - Success: {}, Failed: {}",
            update.processed, update.success, update.failure
        ),
    }
}
