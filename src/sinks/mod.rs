//! Destinations for the final report.
mod console;
mod format;
mod json;


use async_trait::async_trait;

use crate::controller::FinalReport;
use crate::error::AppResult;

pub use console::{ConsoleReport, render_report};
pub use json::{JsonReport, report_json};

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publishes `report`.
    ///
    /// # Errors
    ///
    /// Returns an error when the report cannot be written.
    async fn emit(&self, report: &FinalReport) -> AppResult<()>;
}
