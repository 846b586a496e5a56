//! Batch outcome report: per-job summaries plus aggregated metrics.

pub mod collector;
pub mod export;
pub mod notify;
pub mod store;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::FileType;
use crate::model::{Job, Lifecycle, LogEntry, LogLevel, Status, Step, Task};

pub use collector::collect;
pub use export::{export, write_report, ReportFormat};
pub use notify::{LogNotifier, Notifier};
pub use store::ReportStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub execution_start: DateTime<Utc>,
    pub execution_end: DateTime<Utc>,
    pub total_duration_ms: i64,
    pub manually_triggered: bool,
    pub status: Status,
    pub jobs: Vec<JobSummary>,
    pub errors: Vec<LogEntry>,
    pub warnings: Vec<LogEntry>,
    pub totals: AggregatedMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: Uuid,
    pub name: String,
    pub file_path: String,
    pub file_type: FileType,
    pub status: Status,
    pub duration_ms: i64,
    pub tasks: Vec<TaskSummary>,
    pub records_processed: u64,
    pub records_failed: u64,
    pub records_skipped: u64,
    pub error_count: u64,
    pub errors: Vec<LogEntry>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id(),
            name: job.name().to_string(),
            file_path: job.file_path().display().to_string(),
            file_type: job.file_type(),
            status: job.status(),
            duration_ms: job.metrics().duration_ms(),
            tasks: job.tasks().iter().map(TaskSummary::from).collect(),
            records_processed: job.metrics().records_processed(),
            records_failed: job.metrics().records_failed(),
            records_skipped: job.metrics().records_skipped(),
            error_count: job.metrics().error_count(),
            errors: job
                .logs()
                .iter()
                .filter(|l| l.level == LogLevel::Error)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub status: Status,
    pub duration_ms: i64,
    pub steps: Vec<StepSummary>,
    pub records_processed: u64,
    pub records_failed: u64,
}

impl From<&Task> for TaskSummary {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id(),
            name: task.name().to_string(),
            order: task.order(),
            status: task.status(),
            duration_ms: task.metrics().duration_ms(),
            steps: task.steps().iter().map(StepSummary::from).collect(),
            records_processed: task.metrics().records_processed(),
            records_failed: task.metrics().records_failed(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub order: i32,
    pub status: Status,
    pub duration_ms: i64,
    pub records_processed: u64,
    pub records_failed: u64,
    pub error_count: u64,
    pub warning_count: u64,
}

impl From<&Step> for StepSummary {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id(),
            name: step.name().to_string(),
            kind: step.kind().to_string(),
            order: step.order(),
            status: step.status(),
            duration_ms: step.metrics().duration_ms(),
            records_processed: step.metrics().records_processed(),
            records_failed: step.metrics().records_failed(),
            error_count: step.metrics().error_count(),
            warning_count: step.metrics().warning_count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_jobs: u64,
    pub successful_jobs: u64,
    pub failed_jobs: u64,
    pub partial_jobs: u64,
    pub skipped_jobs: u64,
    pub total_records_processed: u64,
    pub total_records_failed: u64,
    pub total_records_skipped: u64,
    pub total_errors: u64,
    pub total_warnings: u64,
    /// Percentage of jobs that ended `SUCCESS`; 0 for an empty batch.
    pub overall_success_rate: f64,
}

impl AggregatedMetrics {
    pub fn from_jobs(jobs: &[Job]) -> Self {
        let count = |status: Status| jobs.iter().filter(|j| j.status() == status).count() as u64;
        let sum = |f: fn(&Job) -> u64| jobs.iter().map(f).sum::<u64>();

        let total_jobs = jobs.len() as u64;
        let successful_jobs = count(Status::Success);
        let overall_success_rate = if total_jobs > 0 {
            successful_jobs as f64 / total_jobs as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_jobs,
            successful_jobs,
            failed_jobs: count(Status::Failed),
            partial_jobs: count(Status::Partial),
            skipped_jobs: count(Status::Skipped),
            total_records_processed: sum(|j| j.metrics().records_processed()),
            total_records_failed: sum(|j| j.metrics().records_failed()),
            total_records_skipped: sum(|j| j.metrics().records_skipped()),
            total_errors: sum(|j| j.metrics().error_count()),
            total_warnings: sum(|j| j.metrics().warning_count()),
            overall_success_rate,
        }
    }
}
