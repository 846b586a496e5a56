pub mod loader;
pub mod scanner;
pub mod schema;
pub mod settings;

pub use loader::{load_job_definition, load_job_definition_from_str};
pub use scanner::JobDefinitionScanner;
pub use schema::*;
pub use settings::{load_settings, load_settings_from_str, Settings};
