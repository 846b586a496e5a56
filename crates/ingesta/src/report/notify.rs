use std::error::Error;

use log::info;

use super::ProcessReport;

pub type NotifyError = Box<dyn Error + Send + Sync>;

/// Delivers a finished report somewhere outside the engine.
pub trait Notifier: Send + Sync {
    fn notify(&self, report: &ProcessReport) -> Result<(), NotifyError>;
}

/// Writes a report summary to the application log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &ProcessReport) -> Result<(), NotifyError> {
        let totals = &report.totals;
        info!("=== Ingestion report {} ===", report.id);
        info!(
            "Status: {} | Duration: {} ms | Triggered: {}",
            report.status,
            report.total_duration_ms,
            if report.manually_triggered { "manual" } else { "scheduled" }
        );
        info!(
            "Jobs: {} total | {} success | {} partial | {} failed | {} skipped",
            totals.total_jobs,
            totals.successful_jobs,
            totals.partial_jobs,
            totals.failed_jobs,
            totals.skipped_jobs
        );
        info!(
            "Records: {} processed | {} failed | success rate {:.1}%",
            totals.total_records_processed, totals.total_records_failed, totals.overall_success_rate
        );
        Ok(())
    }
}
