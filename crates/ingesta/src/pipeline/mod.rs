pub mod context;
pub mod error;
pub mod runner;
pub mod transform;

pub use context::{JobContext, RowTally};
pub use error::{JobError, StepError};
pub use runner::{terminal_status, JobProcessor};
