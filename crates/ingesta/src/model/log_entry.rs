use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::status::LogLevel;
use crate::error::cause_chain;

/// One structured log line recorded against a job, task or step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Name of the entity that produced the entry.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source: source.into(),
            cause: None,
            context: BTreeMap::new(),
        }
    }

    pub fn info(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, source, message)
    }

    pub fn warn(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, source, message)
    }

    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, source, message)
    }

    /// Builds an error entry from `err`, keeping its source chain as the cause.
    pub fn from_error(
        source: impl Into<String>,
        message: impl Into<String>,
        err: &dyn std::error::Error,
    ) -> Self {
        let message = format!("{}: {}", message.into(), err);
        let mut entry = Self::error(source, message);
        entry.cause = cause_chain(err);
        entry
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }
}
