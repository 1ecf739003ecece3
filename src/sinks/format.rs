use std::fmt::Write as _;
use std::time::Duration;

use crate::error::{AppError, AppResult, SinkError};

pub(super) fn write_line(output: &mut String, line: &str) -> AppResult<()> {
    writeln!(output, "{}", line).map_err(|err| AppError::sink(SinkError::WriteLine { source: err }))
}

pub(super) fn format_x100(value: u64) -> String {
    format!("{}.{:02}", value / 100, value % 100)
}

/// Milliseconds with two decimals, e.g. `12.34ms`.
pub(super) fn format_ms(value: Duration) -> String {
    let micros = value.as_micros();
    format!("{}.{:02}ms", micros / 1000, (micros % 1000) / 10)
}

/// Seconds with two decimals, e.g. `3.25s`.
pub(super) fn format_secs(value: Duration) -> String {
    let millis = value.as_millis();
    format!("{}.{:02}s", millis / 1000, (millis % 1000) / 10)
}

pub(super) fn duration_ms(value: Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}
