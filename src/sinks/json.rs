use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::controller::FinalReport;
use crate::error::{AppError, AppResult, SinkError};

use super::ReportSink;
use super::format::duration_ms;

/// Writes the report as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), std::io::Error> {
        let file = tokio::fs::File::create(&self.path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ReportSink for JsonReport {
    async fn emit(&self, report: &FinalReport) -> AppResult<()> {
        let payload = report_json(report);
        let json = serde_json::to_vec_pretty(&payload)
            .map_err(|err| AppError::sink(SinkError::SerializeReport { source: err }))?;
        self.write(&json).await.map_err(|err| {
            AppError::sink(SinkError::WriteReport {
                path: self.path.clone(),
                source: err,
            })
        })?;
        info!("Report written to {}", self.path.display());
        Ok(())
    }
}

#[must_use]
pub fn report_json(report: &FinalReport) -> serde_json::Value {
    let errors: Vec<serde_json::Value> = report
        .errors
        .iter()
        .map(|error| {
            serde_json::json!({
                "message": error.message,
                "count": error.count
            })
        })
        .collect();

    serde_json::json!({
        "started_at": report.started_at.to_rfc3339(),
        "completed": report.completed(),
        "stop_reason": report.stop_reason.map(|reason| reason.to_string()),
        "planned_requests": report.planned_requests,
        "total_requests": report.total_requests,
        "successful_requests": report.success_count,
        "failed_requests": report.failure_count,
        "timeout_requests": report.timeout_count,
        "duration_ms": duration_ms(report.duration),
        "success_rate_x100": report.success_rate_x100,
        "requests_per_second_x100": report.requests_per_second_x100,
        "requests_per_minute_x100": report.requests_per_minute_x100,
        "avg_response_time_ms": duration_ms(report.average_time),
        "min_response_time_ms": duration_ms(report.min_time),
        "max_response_time_ms": duration_ms(report.max_time),
        "p50_response_time_ms": duration_ms(report.p50),
        "p90_response_time_ms": duration_ms(report.p90),
        "p99_response_time_ms": duration_ms(report.p99),
        "errors": errors
    })
}
