use std::fmt;

use serde::{Serialize, Serializer};

/// Lifecycle status shared by jobs, tasks and steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pending,
    Running,
    Success,
    Failed,
    Partial,
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Running => "RUNNING",
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
            Status::Partial => "PARTIAL",
            Status::Skipped => "SKIPPED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Success | Status::Failed | Status::Partial | Status::Skipped
        )
    }

    /// Statuses a running entity may be completed with.
    pub fn is_completion(&self) -> bool {
        matches!(self, Status::Success | Status::Failed | Status::Partial)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskKind {
    Transformation,
    Persistence,
}

impl TaskKind {
    /// Parses a task type name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TRANSFORMATION" => Some(TaskKind::Transformation),
            "PERSISTENCE" => Some(TaskKind::Persistence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Transformation => "TRANSFORMATION",
            TaskKind::Persistence => "PERSISTENCE",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation performed by a step.
///
/// `Other` keeps the configured name of a kind the engine does not know, so
/// it can be reported instead of dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepKind {
    Trim,
    Uppercase,
    Concatenate,
    Select,
    Insert,
    Truncate,
    Other(String),
}

impl StepKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "TRIM" => StepKind::Trim,
            "UPPERCASE" => StepKind::Uppercase,
            "CONCATENATE" => StepKind::Concatenate,
            "SELECT" => StepKind::Select,
            "INSERT" => StepKind::Insert,
            "TRUNCATE" => StepKind::Truncate,
            _ => StepKind::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepKind::Trim => "TRIM",
            StepKind::Uppercase => "UPPERCASE",
            StepKind::Concatenate => "CONCATENATE",
            StepKind::Select => "SELECT",
            StepKind::Insert => "INSERT",
            StepKind::Truncate => "TRUNCATE",
            StepKind::Other(name) => name,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StepKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
