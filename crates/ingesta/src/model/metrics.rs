use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::status::LogLevel;

/// Timing and record counters of one job, task or step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    duration_ms: i64,
    records_processed: u64,
    records_failed: u64,
    records_skipped: u64,
    error_count: u64,
    warning_count: u64,
    custom: BTreeMap<String, serde_json::Value>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.start_time = Some(at);
    }

    pub(crate) fn mark_finished(&mut self, at: DateTime<Utc>) {
        self.end_time = Some(at);
        if let Some(start) = self.start_time {
            self.duration_ms = (at - start).num_milliseconds().max(0);
        }
    }

    /// Bumps the error or warning counter for an entry of `level`.
    pub(crate) fn record_level(&mut self, level: LogLevel) {
        match level {
            LogLevel::Error => self.error_count += 1,
            LogLevel::Warn => self.warning_count += 1,
            LogLevel::Info => {}
        }
    }

    pub fn increment_processed(&mut self, count: u64) {
        self.records_processed += count;
    }

    pub fn increment_failed(&mut self, count: u64) {
        self.records_failed += count;
    }

    pub fn increment_skipped(&mut self, count: u64) {
        self.records_skipped += count;
    }

    pub fn add_custom_metric(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.custom.insert(key.into(), value.into());
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn records_processed(&self) -> u64 {
        self.records_processed
    }

    pub fn records_failed(&self) -> u64 {
        self.records_failed
    }

    pub fn records_skipped(&self) -> u64 {
        self.records_skipped
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn warning_count(&self) -> u64 {
        self.warning_count
    }

    pub fn custom_metric(&self, key: &str) -> Option<&serde_json::Value> {
        self.custom.get(key)
    }

    pub fn custom_metrics(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.custom
    }
}
