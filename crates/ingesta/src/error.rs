use std::path::PathBuf;

use thiserror::Error;

use crate::config::SourceType;
use crate::model::Status;

#[derive(Error, Debug)]
pub enum IngestaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse job definition YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid task '{name}': {reason}")]
    InvalidTask { name: String, reason: String },

    #[error("Invalid mapping for column '{column}': {reason}")]
    InvalidMapping { column: String, reason: String },

    #[error("Invalid parameters for step '{step}': {source}")]
    InvalidParameters {
        step: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Raised when an entity is asked to move to a status its current status
/// does not allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} '{name}' cannot move from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub name: String,
    pub from: Status,
    pub to: Status,
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workbook archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Workbook '{path}' has no worksheet")]
    MissingWorksheet { path: PathBuf },

    #[error("Malformed XML in '{path}': {reason}")]
    Xml { path: PathBuf, reason: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source file not found: {0}")]
    NotFound(PathBuf),

    #[error("No downloader available for source type {0}")]
    NoDownloader(SourceType),

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free file name left in '{0}'")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("No column mappings resolved for table '{table}'")]
    NoColumns { table: String },

    #[error("Unknown table '{table}'")]
    UnknownTable { table: String },

    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write report to '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, IngestaError>;

/// Renders the chain of underlying causes of `err`, outermost first.
///
/// Returns `None` when the error has no source.
pub fn cause_chain(err: &dyn std::error::Error) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    if causes.is_empty() {
        None
    } else {
        Some(causes.join(": "))
    }
}
