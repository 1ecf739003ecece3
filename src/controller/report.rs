use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::aggregator::RunStats;

use super::StopReason;

const PERCENTILE_P50: u64 = 50;
const PERCENTILE_P90: u64 = 90;
const PERCENTILE_P99: u64 = 99;
const PERCENTILE_ROUNDING: u64 = 50;
const PERCENT_DIVISOR: u64 = 100;
const MS_PER_SECOND: u128 = 1_000;
const MS_PER_MINUTE: u128 = 60_000;

/// One line of the error breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCount {
    pub message: String,
    pub count: u64,
}

/// Summary derived once from the frozen stats of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub started_at: DateTime<Utc>,
    /// Planned request count; `None` for open-ended runs.
    pub planned_requests: Option<u64>,
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub timeout_count: u64,
    pub duration: Duration,
    pub success_rate_x100: u64,
    pub requests_per_second_x100: u64,
    pub requests_per_minute_x100: u64,
    pub average_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
    pub errors: Vec<ErrorCount>,
    pub stop_reason: Option<StopReason>,
}

impl FinalReport {
    #[must_use]
    pub fn from_stats(
        stats: &RunStats,
        duration: Duration,
        planned_requests: Option<u64>,
        stop_reason: Option<StopReason>,
    ) -> Self {
        let total = stats.processed();
        let (p50, p90, p99) = compute_percentiles(stats.response_times());

        Self {
            started_at: stats.started_at(),
            planned_requests,
            total_requests: total,
            success_count: stats.success_count(),
            failure_count: stats.failure_count(),
            timeout_count: stats.timeout_count(),
            duration,
            success_rate_x100: success_rate_x100(stats.success_count(), total),
            requests_per_second_x100: rate_x100(total, duration, MS_PER_SECOND),
            requests_per_minute_x100: rate_x100(total, duration, MS_PER_MINUTE),
            average_time: stats.average_time(),
            min_time: stats.min_time(),
            max_time: stats.max_time(),
            p50,
            p90,
            p99,
            errors: sorted_errors(stats),
            stop_reason,
        }
    }

    /// True when every planned request was processed.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.stop_reason.is_none()
            && self
                .planned_requests
                .is_none_or(|planned| planned == self.total_requests)
    }
}

fn success_rate_x100(success: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(success)
        .saturating_mul(10_000)
        .checked_div(u128::from(total))
        .unwrap_or(0);
    u64::try_from(scaled).map_or(u64::MAX, |value| value)
}

/// Requests per `per_ms` window, scaled by 100.
fn rate_x100(total: u64, duration: Duration, per_ms: u128) -> u64 {
    if total == 0 {
        return 0;
    }
    let duration_ms = duration.as_millis().max(1);
    let scaled = u128::from(total)
        .saturating_mul(per_ms)
        .saturating_mul(100)
        .checked_div(duration_ms)
        .unwrap_or(0);
    u64::try_from(scaled).map_or(u64::MAX, |value| value)
}

fn sorted_errors(stats: &RunStats) -> Vec<ErrorCount> {
    let mut errors: Vec<ErrorCount> = stats
        .error_histogram()
        .iter()
        .map(|(message, count)| ErrorCount {
            message: message.clone(),
            count: *count,
        })
        .collect();
    errors.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.message.cmp(&right.message))
    });
    errors
}

fn compute_percentiles(times: &[Duration]) -> (Duration, Duration, Duration) {
    if times.is_empty() {
        return (Duration::ZERO, Duration::ZERO, Duration::ZERO);
    }
    let mut sorted = times.to_vec();
    sorted.sort_unstable();

    (
        percentile(&sorted, PERCENTILE_P50),
        percentile(&sorted, PERCENTILE_P90),
        percentile(&sorted, PERCENTILE_P99),
    )
}

fn percentile(values: &[Duration], percentile: u64) -> Duration {
    if values.is_empty() {
        return Duration::ZERO;
    }
    let count = u64::try_from(values.len().saturating_sub(1)).unwrap_or(u64::MAX);
    let index = percentile
        .saturating_mul(count)
        .saturating_add(PERCENTILE_ROUNDING)
        .checked_div(PERCENT_DIVISOR)
        .unwrap_or(0);
    let idx = usize::try_from(index).unwrap_or_else(|_| values.len().saturating_sub(1));
    values.get(idx).copied().unwrap_or(Duration::ZERO)
}
