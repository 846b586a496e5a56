use std::path::{Path, PathBuf};

use log::warn;

use crate::config::{JobDefinition, StepParameters};
use crate::error::ConfigError;
use crate::model::{Job, Lifecycle, Step, StepKind, Task, TaskKind};

/// Builds executable jobs from loaded definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobFactory;

impl JobFactory {
    pub fn new() -> Self {
        Self
    }

    /// Builds the Job → Task → Step tree for a definition whose source file
    /// is available at `file_path`.
    ///
    /// Step parameters are the job, task and step layers merged in that
    /// order, so step values win.
    pub fn create_job(
        &self,
        definition: &JobDefinition,
        file_path: impl Into<PathBuf>,
    ) -> Result<Job, ConfigError> {
        let mut job = Job::new(definition.name.clone(), file_path, definition.file_type);
        job.metrics_mut()
            .add_custom_metric("batchSize", definition.effective_batch_size());

        for task_def in &definition.tasks {
            let kind = TaskKind::parse(&task_def.task_type).ok_or_else(|| ConfigError::InvalidTask {
                name: task_def.name.clone(),
                reason: format!("unknown task type '{}'", task_def.task_type),
            })?;
            let mut task = Task::new(
                task_def.name.clone(),
                kind,
                task_def.order,
                task_def.stop_on_failure,
            );

            for step_def in &task_def.subtasks {
                let parameters = StepParameters::from_layers(
                    &step_def.name,
                    &[&definition.parameters, &task_def.parameters, &step_def.parameters],
                )?;
                task.add_step(Step::with_parameters(
                    step_def.name.clone(),
                    StepKind::parse(&step_def.step_type),
                    step_def.order,
                    parameters,
                ));
            }

            job.add_task(task);
        }

        Ok(job)
    }

    /// A job that never runs because its source file is unavailable.
    pub fn skipped_job(&self, definition: &JobDefinition, reason: &str) -> Job {
        let mut job = Job::new(
            definition.name.clone(),
            definition.source.location.path.clone(),
            definition.file_type,
        );
        if let Err(e) = job.skip(reason) {
            warn!("Could not mark job '{}' as skipped: {}", definition.name, e);
        }
        job
    }

    /// True when the file exists and can be opened for reading.
    pub fn can_load_file(&self, path: &Path) -> bool {
        path.is_file() && std::fs::File::open(path).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_job_definition_from_str, FileType};
    use crate::model::{LogLevel, Status};
    use serde_json::json;

    const DEFINITION: &str = r#"
name: clientes
fileType: XML
batchSize: 0
source:
  type: LOCAL
  location:
    path: /data/clientes.xml
parameters:
  tableName: clientes
  schema: main
tasks:
  - name: carga
    order: 2
    type: PERSISTENCE
    parameters:
      tableName: clientes_stage
    subtasks:
      - name: insert
        order: 2
        type: INSERT
        parameters:
          autoMap: false
      - name: truncate
        order: 1
        type: truncate
  - name: limpieza
    order: 1
    type: TRANSFORMATION
    subtasks:
      - name: lower
        order: 1
        type: LOWERCASE
"#;

    #[test]
    fn test_create_job_builds_sorted_tree() {
        let def = load_job_definition_from_str(DEFINITION).unwrap();
        let job = JobFactory::new().create_job(&def, "/work/clientes.xml").unwrap();

        assert_eq!(job.name(), "clientes");
        assert_eq!(job.status(), Status::Pending);
        assert_eq!(job.file_type(), FileType::Xml);
        assert_eq!(job.file_path(), Path::new("/work/clientes.xml"));

        let tasks: Vec<&str> = job.tasks().iter().map(|t| t.name()).collect();
        assert_eq!(tasks, vec!["limpieza", "carga"]);

        let carga = &job.tasks()[1];
        assert_eq!(carga.kind(), TaskKind::Persistence);
        assert_eq!(*carga.steps()[0].kind(), StepKind::Truncate);
        assert_eq!(*carga.steps()[1].kind(), StepKind::Insert);
        assert_eq!(
            *job.tasks()[0].steps()[0].kind(),
            StepKind::Other("LOWERCASE".to_string())
        );
    }

    #[test]
    fn test_parameters_merge_job_task_step() {
        let def = load_job_definition_from_str(DEFINITION).unwrap();
        let job = JobFactory::new().create_job(&def, "/work/clientes.xml").unwrap();

        let insert = job.tasks()[1].steps()[1].parameters();
        assert_eq!(insert.table_name, "clientes_stage");
        assert_eq!(insert.schema.as_deref(), Some("main"));
        assert!(!insert.auto_map);

        let lower = job.tasks()[0].steps()[0].parameters();
        assert_eq!(lower.table_name, "clientes");
        assert!(lower.auto_map);
    }

    #[test]
    fn test_batch_size_metric_falls_back_to_default() {
        let def = load_job_definition_from_str(DEFINITION).unwrap();
        let job = JobFactory::new().create_job(&def, "/work/clientes.xml").unwrap();
        assert_eq!(job.metrics().custom_metric("batchSize"), Some(&json!(500)));
    }

    #[test]
    fn test_skipped_job() {
        let def = load_job_definition_from_str(DEFINITION).unwrap();
        let job = JobFactory::new().skipped_job(&def, "Data file could not be loaded");

        assert_eq!(job.status(), Status::Skipped);
        assert_eq!(job.metrics().warning_count(), 1);
        let entry = job.logs().last().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert!(entry.message.contains("Data file could not be loaded"));
    }

    #[test]
    fn test_can_load_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("a.xlsx");
        std::fs::write(&file, b"x").unwrap();

        let factory = JobFactory::new();
        assert!(factory.can_load_file(&file));
        assert!(!factory.can_load_file(temp.path()));
        assert!(!factory.can_load_file(&temp.path().join("missing.xlsx")));
    }
}
