use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::ProcessReport;
use crate::db::DatabaseError;

#[derive(Default)]
struct Inner {
    reports: HashMap<Uuid, ProcessReport>,
    order: Vec<Uuid>,
}

/// In-memory report store keyed by report id.
#[derive(Clone, Default)]
pub struct ReportStore {
    inner: Arc<Mutex<Inner>>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the report, replacing any report with the same id.
    pub fn save(&self, report: ProcessReport) -> Result<(), DatabaseError> {
        let mut inner = self.inner.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let id = report.id;
        if inner.reports.insert(id, report).is_none() {
            inner.order.push(id);
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<ProcessReport>, DatabaseError> {
        let inner = self.inner.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(inner.reports.get(&id).cloned())
    }

    /// The most recently saved report.
    pub fn latest(&self) -> Result<Option<ProcessReport>, DatabaseError> {
        let inner = self.inner.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(inner
            .order
            .last()
            .and_then(|id| inner.reports.get(id))
            .cloned())
    }

    pub fn len(&self) -> Result<usize, DatabaseError> {
        let inner = self.inner.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(inner.reports.len())
    }
}
