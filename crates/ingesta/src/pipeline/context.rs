use crate::model::Row;

/// Row buffer and running counters for one job execution.
pub struct JobContext {
    pub rows: Vec<Row>,
    /// Header set captured from the first row; empty when there are no rows.
    pub headers: Vec<String>,
}

impl JobContext {
    pub fn new(rows: Vec<Row>) -> Self {
        let headers = rows.first().map(Row::headers).unwrap_or_default();
        Self { rows, headers }
    }

    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// Record counts a task contributes to its job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowTally {
    pub persisted: u64,
    pub failed: u64,
}
