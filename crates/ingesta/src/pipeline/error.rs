use thiserror::Error;

use crate::config::FileType;
use crate::error::{ConfigError, PersistenceError, ReadError, TransitionError};

/// Failure of a single step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Invalid column mapping: {0}")]
    Mapping(#[from] ConfigError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Failure that ends a task or a whole job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("No reader supports file type {0}")]
    NoReader(FileType),

    #[error("Failed to read source rows: {0}")]
    Read(#[from] ReadError),

    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
