pub mod config;
pub mod db;
pub mod error;
pub mod factory;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod sanitize;
pub mod service;
pub mod source;

pub use config::{load_job_definition, load_settings, JobDefinition, Settings};
pub use error::{
    ConfigError, ExportError, IngestaError, PersistenceError, ReadError, Result, SourceError,
    TransitionError,
};
pub use factory::JobFactory;
pub use mapping::{normalize, ColumnMapping, MappingResolution, SchemaMapper};
pub use model::{Job, Lifecycle, LogEntry, LogLevel, Metrics, Row, Status, Step, Task};
pub use pipeline::JobProcessor;
pub use report::{AggregatedMetrics, ProcessReport, ReportFormat};
pub use service::{ExecuteCommand, IngestionService};
