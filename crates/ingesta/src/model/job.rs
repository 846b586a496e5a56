use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::lifecycle::{Execution, Lifecycle};
use super::task::Task;
use crate::config::FileType;
use crate::error::TransitionError;

/// One ingestion run over a single source file.
#[derive(Debug, Clone)]
pub struct Job {
    id: Uuid,
    file_path: PathBuf,
    file_type: FileType,
    tasks: Vec<Task>,
    execution: Execution,
}

impl Job {
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path: file_path.into(),
            file_type,
            tasks: Vec::new(),
            execution: Execution::new(name),
        }
    }

    /// Adds a task, keeping tasks sorted by their order index.
    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.tasks.sort_by_key(Task::order);
    }

    /// Marks a job that never started as skipped. Terminal.
    pub fn skip(&mut self, reason: &str) -> Result<(), TransitionError> {
        self.execution.skip(Self::ENTITY, reason)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }
}

impl Lifecycle for Job {
    const ENTITY: &'static str = "Job";

    fn execution(&self) -> &Execution {
        &self.execution
    }

    fn execution_mut(&mut self) -> &mut Execution {
        &mut self.execution
    }
}
