//! Execution model: jobs own tasks, tasks own steps, and each carries its
//! own status, metrics and log.

pub mod job;
pub mod lifecycle;
pub mod log_entry;
pub mod metrics;
pub mod row;
pub mod status;
pub mod step;
pub mod task;

pub use job::Job;
pub use lifecycle::{Execution, Lifecycle};
pub use log_entry::LogEntry;
pub use metrics::Metrics;
pub use row::{value_to_text, Row};
pub use status::{LogLevel, Status, StepKind, TaskKind};
pub use step::Step;
pub use task::Task;
