use chrono::Utc;
use uuid::Uuid;

use super::{AggregatedMetrics, JobSummary, ProcessReport};
use crate::model::{Job, Lifecycle, LogLevel, Status};

/// Folds a processed batch into one report.
///
/// The execution window spans the earliest job start to the latest job end;
/// either bound falls back to now when no job has one.
pub fn collect(jobs: &[Job], manually_triggered: bool) -> ProcessReport {
    let now = Utc::now();
    let execution_start = jobs
        .iter()
        .filter_map(|j| j.metrics().start_time())
        .min()
        .unwrap_or(now);
    let execution_end = jobs
        .iter()
        .filter_map(|j| j.metrics().end_time())
        .max()
        .unwrap_or(now);

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for entry in jobs.iter().flat_map(|j| j.logs()) {
        match entry.level {
            LogLevel::Error => errors.push(entry.clone()),
            LogLevel::Warn => warnings.push(entry.clone()),
            LogLevel::Info => {}
        }
    }

    ProcessReport {
        id: Uuid::new_v4(),
        generated_at: now,
        execution_start,
        execution_end,
        total_duration_ms: (execution_end - execution_start).num_milliseconds().max(0),
        manually_triggered,
        status: overall_status(jobs),
        jobs: jobs.iter().map(JobSummary::from).collect(),
        errors,
        warnings,
        totals: AggregatedMetrics::from_jobs(jobs),
    }
}

fn overall_status(jobs: &[Job]) -> Status {
    if jobs.iter().all(|j| j.status() == Status::Success) {
        return Status::Success;
    }
    if jobs.iter().all(|j| j.status() == Status::Failed) {
        return Status::Failed;
    }
    Status::Partial
}
