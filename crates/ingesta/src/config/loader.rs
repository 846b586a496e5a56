use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::{JobDefinition, SourceType, StepParameters};
use crate::error::ConfigError;
use crate::mapping::ColumnMapping;
use crate::model::TaskKind;

pub fn load_job_definition<P: AsRef<Path>>(path: P) -> Result<JobDefinition, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_job_definition_from_str(&content)
}

pub fn load_job_definition_from_str(content: &str) -> Result<JobDefinition, ConfigError> {
    let definition: JobDefinition = serde_yaml::from_str(content)?;

    validate_job_definition(&definition)?;

    Ok(definition)
}

fn validate_job_definition(definition: &JobDefinition) -> Result<(), ConfigError> {
    if definition.name.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "job name cannot be empty".to_string(),
        });
    }

    if definition.source.source_type == SourceType::Local
        && definition.source.location.path.trim().is_empty()
    {
        return Err(ConfigError::Validation {
            message: format!("job '{}' has a local source without a path", definition.name),
        });
    }

    let mut orders = HashSet::new();
    for task in &definition.tasks {
        if TaskKind::parse(&task.task_type).is_none() {
            return Err(ConfigError::InvalidTask {
                name: task.name.clone(),
                reason: format!("unknown task type '{}'", task.task_type),
            });
        }

        if !orders.insert(task.order) {
            return Err(ConfigError::InvalidTask {
                name: task.name.clone(),
                reason: format!("duplicate task order {}", task.order),
            });
        }

        for step in &task.subtasks {
            let parameters = StepParameters::from_layers(
                &step.name,
                &[&definition.parameters, &task.parameters, &step.parameters],
            )?;
            for mapping in &parameters.mappings {
                ColumnMapping::try_from(mapping)?;
            }
        }
    }

    Ok(())
}
