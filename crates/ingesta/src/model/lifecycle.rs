use chrono::Utc;

use super::log_entry::LogEntry;
use super::metrics::Metrics;
use super::status::Status;
use crate::error::TransitionError;

/// Status, metrics and log shared by every executable entity.
#[derive(Debug, Clone)]
pub struct Execution {
    name: String,
    status: Status,
    metrics: Metrics,
    logs: Vec<LogEntry>,
}

impl Execution {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: Status::Pending,
            metrics: Metrics::new(),
            logs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut Metrics {
        &mut self.metrics
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    fn reject(&self, entity: &'static str, to: Status) -> TransitionError {
        TransitionError {
            entity,
            name: self.name.clone(),
            from: self.status,
            to,
        }
    }

    pub fn start(&mut self, entity: &'static str) -> Result<(), TransitionError> {
        if self.status != Status::Pending {
            return Err(self.reject(entity, Status::Running));
        }
        self.status = Status::Running;
        self.metrics.mark_started(Utc::now());
        let entry = LogEntry::info(self.name.clone(), format!("{} started", entity));
        self.add_log(entry);
        Ok(())
    }

    pub fn complete(&mut self, entity: &'static str, status: Status) -> Result<(), TransitionError> {
        if self.status != Status::Running || !status.is_completion() {
            return Err(self.reject(entity, status));
        }
        self.status = status;
        self.metrics.mark_finished(Utc::now());
        let entry = LogEntry::info(
            self.name.clone(),
            format!("{} completed with status: {}", entity, status),
        );
        self.add_log(entry);
        Ok(())
    }

    pub fn skip(&mut self, entity: &'static str, reason: &str) -> Result<(), TransitionError> {
        if self.status != Status::Pending {
            return Err(self.reject(entity, Status::Skipped));
        }
        self.status = Status::Skipped;
        let entry = LogEntry::warn(self.name.clone(), format!("{} skipped: {}", entity, reason));
        self.add_log(entry);
        Ok(())
    }

    pub fn add_log(&mut self, entry: LogEntry) {
        self.metrics.record_level(entry.level);
        self.logs.push(entry);
    }
}

/// Common state machine of jobs, tasks and steps.
///
/// Transitions are `PENDING -> RUNNING -> {SUCCESS, FAILED, PARTIAL}`; any
/// other move is rejected with a [`TransitionError`] and leaves the entity
/// untouched.
pub trait Lifecycle {
    /// Entity label used in log messages and errors.
    const ENTITY: &'static str;

    fn execution(&self) -> &Execution;

    fn execution_mut(&mut self) -> &mut Execution;

    fn name(&self) -> &str {
        self.execution().name()
    }

    fn status(&self) -> Status {
        self.execution().status()
    }

    fn metrics(&self) -> &Metrics {
        self.execution().metrics()
    }

    fn metrics_mut(&mut self) -> &mut Metrics {
        self.execution_mut().metrics_mut()
    }

    fn logs(&self) -> &[LogEntry] {
        self.execution().logs()
    }

    fn start(&mut self) -> Result<(), TransitionError> {
        self.execution_mut().start(Self::ENTITY)
    }

    fn complete(&mut self, status: Status) -> Result<(), TransitionError> {
        self.execution_mut().complete(Self::ENTITY, status)
    }

    fn add_log(&mut self, entry: LogEntry) {
        self.execution_mut().add_log(entry);
    }
}
