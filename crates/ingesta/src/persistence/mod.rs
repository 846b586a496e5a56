//! Storage collaborators used by persistence tasks.

use crate::config::StepParameters;
use crate::error::PersistenceError;
use crate::mapping::ColumnMapping;
use crate::model::Row;

pub mod sqlite;

pub use sqlite::SqliteBackend;

/// Writes rows to the target store.
pub trait Persistence: Send + Sync {
    /// Inserts every row, binding one value per mapping. Returns the number
    /// of rows written.
    fn insert_data(
        &self,
        rows: &[Row],
        mappings: &[ColumnMapping],
        parameters: &StepParameters,
    ) -> Result<usize, PersistenceError>;

    /// Runs a check query and returns its first value (null when the query
    /// yields nothing).
    fn check(
        &self,
        query: Option<&str>,
        parameters: &StepParameters,
    ) -> Result<serde_json::Value, PersistenceError>;

    /// Removes every row of the target table.
    fn truncate(&self, parameters: &StepParameters) -> Result<(), PersistenceError>;
}

/// Reports the columns of a target table.
pub trait SchemaIntrospector: Send + Sync {
    /// Column names of `table`, uppercased.
    fn column_names(&self, table: &str, schema: Option<&str>) -> Result<Vec<String>, PersistenceError>;
}
