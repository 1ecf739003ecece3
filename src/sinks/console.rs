use async_trait::async_trait;

use crate::controller::FinalReport;
use crate::error::AppResult;

use super::ReportSink;
use super::format::{format_ms, format_secs, format_x100, write_line};

const RULE_WIDTH: usize = 60;

/// Prints the summary block to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

#[async_trait]
impl ReportSink for ConsoleReport {
    async fn emit(&self, report: &FinalReport) -> AppResult<()> {
        let rendered = render_report(report)?;
        print!("{}", rendered);
        Ok(())
    }
}

/// Renders the summary block shown at the end of a run.
///
/// # Errors
///
/// Returns an error if writing into the buffer fails.
pub fn render_report(report: &FinalReport) -> AppResult<String> {
    let mut output = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    write_line(&mut output, "")?;
    write_line(&mut output, &rule)?;
    write_line(&mut output, "LOAD TEST RESULTS")?;
    write_line(&mut output, &rule)?;
    write_line(
        &mut output,
        &format!("Total Requests: {}", report.total_requests),
    )?;
    if let Some(planned) = report.planned_requests
        && planned != report.total_requests
    {
        write_line(&mut output, &format!("Planned Requests: {}", planned))?;
    }
    write_line(
        &mut output,
        &format!(
            "Successful Requests: {} ({}%)",
            report.success_count,
            format_x100(report.success_rate_x100)
        ),
    )?;
    write_line(
        &mut output,
        &format!("Failed Requests: {}", report.failure_count),
    )?;
    write_line(
        &mut output,
        &format!("Timed Out Requests: {}", report.timeout_count),
    )?;
    write_line(
        &mut output,
        &format!("Total Test Time: {}", format_secs(report.duration)),
    )?;
    write_line(
        &mut output,
        &format!(
            "Requests Per Second: {}",
            format_x100(report.requests_per_second_x100)
        ),
    )?;
    write_line(
        &mut output,
        &format!(
            "Requests Per Minute: {}",
            format_x100(report.requests_per_minute_x100)
        ),
    )?;
    write_line(
        &mut output,
        &format!("Average Response Time: {}", format_ms(report.average_time)),
    )?;
    write_line(
        &mut output,
        &format!("Min Response Time: {}", format_ms(report.min_time)),
    )?;
    write_line(
        &mut output,
        &format!("Max Response Time: {}", format_ms(report.max_time)),
    )?;
    write_line(
        &mut output,
        &format!(
            "P50/P90/P99 Response Time: {} / {} / {}",
            format_ms(report.p50),
            format_ms(report.p90),
            format_ms(report.p99)
        ),
    )?;
    if let Some(reason) = report.stop_reason {
        write_line(&mut output, &format!("Stopped Early: {}", reason))?;
    }

    if !report.errors.is_empty() {
        write_line(&mut output, "")?;
        write_line(&mut output, "Error Summary:")?;
        for error in &report.errors {
            write_line(
                &mut output,
                &format!("- {}: {} occurrences", error.message, error.count),
            )?;
        }
    }
    write_line(&mut output, &rule)?;
    Ok(output)
}
