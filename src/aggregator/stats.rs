use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::outcome::{Outcome, OutcomeKind};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Running totals for one run. Folded by the aggregator only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    success_count: u64,
    failure_count: u64,
    timeout_count: u64,
    response_times: Vec<Duration>,
    min_time: Option<Duration>,
    max_time: Option<Duration>,
    error_histogram: BTreeMap<String, u64>,
    started_at: DateTime<Utc>,
}

impl RunStats {
    #[must_use]
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            success_count: 0,
            failure_count: 0,
            timeout_count: 0,
            response_times: Vec::new(),
            min_time: None,
            max_time: None,
            error_histogram: BTreeMap::new(),
            started_at,
        }
    }

    pub fn fold(&mut self, outcome: &Outcome) {
        if outcome.kind.is_success() {
            self.success_count = self.success_count.saturating_add(1);
            self.response_times.push(outcome.elapsed);
            self.min_time = Some(
                self.min_time
                    .map_or(outcome.elapsed, |min| min.min(outcome.elapsed)),
            );
            self.max_time = Some(
                self.max_time
                    .map_or(outcome.elapsed, |max| max.max(outcome.elapsed)),
            );
            return;
        }

        self.failure_count = self.failure_count.saturating_add(1);
        if outcome.kind == OutcomeKind::Timeout {
            self.timeout_count = self.timeout_count.saturating_add(1);
        }
        let message = outcome
            .error_message
            .clone()
            .unwrap_or_else(|| UNKNOWN_ERROR.to_owned());
        let count = self.error_histogram.entry(message).or_insert(0);
        *count = count.saturating_add(1);
    }

    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }

    #[must_use]
    pub const fn success_count(&self) -> u64 {
        self.success_count
    }

    #[must_use]
    pub const fn failure_count(&self) -> u64 {
        self.failure_count
    }

    #[must_use]
    pub const fn timeout_count(&self) -> u64 {
        self.timeout_count
    }

    #[must_use]
    pub fn response_times(&self) -> &[Duration] {
        &self.response_times
    }

    /// Fastest success, zero when nothing succeeded.
    #[must_use]
    pub fn min_time(&self) -> Duration {
        self.min_time.unwrap_or(Duration::ZERO)
    }

    /// Slowest success, zero when nothing succeeded.
    #[must_use]
    pub fn max_time(&self) -> Duration {
        self.max_time.unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub const fn error_histogram(&self) -> &BTreeMap<String, u64> {
        &self.error_histogram
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Mean success time, zero when nothing succeeded.
    #[must_use]
    pub fn average_time(&self) -> Duration {
        let count = u128::try_from(self.response_times.len()).unwrap_or(u128::MAX);
        if count == 0 {
            return Duration::ZERO;
        }
        let total: u128 = self
            .response_times
            .iter()
            .fold(0_u128, |acc, elapsed| acc.saturating_add(elapsed.as_nanos()));
        let avg = total.checked_div(count).unwrap_or(0);
        Duration::from_nanos(u64::try_from(avg).unwrap_or(u64::MAX))
    }
}
