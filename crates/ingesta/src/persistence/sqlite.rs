use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use super::{Persistence, SchemaIntrospector};
use crate::config::StepParameters;
use crate::db::{Database, DatabaseError};
use crate::error::PersistenceError;
use crate::mapping::ColumnMapping;
use crate::model::Row;

const DEFAULT_CHECK_QUERY: &str = "SELECT 1";

/// Persistence and schema introspection over a SQLite database.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Database,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> Result<String, PersistenceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", trimmed.replace('"', "\"\"")))
}

fn qualified_table(table: &str, schema: Option<&str>) -> Result<String, PersistenceError> {
    match schema.filter(|s| !s.trim().is_empty()) {
        Some(schema) => Ok(format!(
            "{}.{}",
            quote_identifier(schema)?,
            quote_identifier(table)?
        )),
        None => quote_identifier(table),
    }
}

fn to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::from(bytes.len()),
    }
}

impl Persistence for SqliteBackend {
    fn insert_data(
        &self,
        rows: &[Row],
        mappings: &[ColumnMapping],
        parameters: &StepParameters,
    ) -> Result<usize, PersistenceError> {
        if rows.is_empty() {
            return Ok(0);
        }
        if mappings.is_empty() {
            return Err(PersistenceError::NoColumns {
                table: parameters.table_name.clone(),
            });
        }

        let table = qualified_table(&parameters.table_name, parameters.schema.as_deref())?;
        let columns = mappings
            .iter()
            .map(|m| quote_identifier(&m.target))
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders: Vec<String> = (1..=mappings.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let inserted = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut count = 0;
            {
                let mut stmt = tx.prepare(&sql)?;
                for row in rows {
                    let values: Vec<SqlValue> = mappings
                        .iter()
                        .map(|m| to_sql_value(m.resolve_value(row)))
                        .collect();
                    count += stmt.execute(rusqlite::params_from_iter(values))?;
                }
            }
            tx.commit()?;
            Ok(count)
        })?;

        log::info!("Inserted {} rows into {}", inserted, table);
        Ok(inserted)
    }

    fn check(
        &self,
        query: Option<&str>,
        _parameters: &StepParameters,
    ) -> Result<Value, PersistenceError> {
        let query = query
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(DEFAULT_CHECK_QUERY);

        let value = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(query)?;
            let mut rows = stmt.query([])?;
            let first = match rows.next()? {
                Some(row) => from_sql_value(row.get::<_, SqlValue>(0)?),
                None => Value::Null,
            };
            Ok(first)
        })?;

        log::debug!("Check query returned {}", value);
        Ok(value)
    }

    fn truncate(&self, parameters: &StepParameters) -> Result<(), PersistenceError> {
        let table = qualified_table(&parameters.table_name, parameters.schema.as_deref())?;
        let removed = self.db.with_conn(|conn| {
            Ok(conn.execute(&format!("DELETE FROM {}", table), [])?)
        })?;
        log::info!("Truncated {} ({} rows removed)", table, removed);
        Ok(())
    }
}

impl SchemaIntrospector for SqliteBackend {
    fn column_names(&self, table: &str, schema: Option<&str>) -> Result<Vec<String>, PersistenceError> {
        let prefix = match schema.filter(|s| !s.trim().is_empty()) {
            Some(schema) => format!("{}.", quote_identifier(schema)?),
            None => String::new(),
        };
        let sql = format!("PRAGMA {}table_info({})", prefix, quote_identifier(table)?);

        let columns = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>("name"))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(DatabaseError::from)?;
            Ok(names)
        })?;

        if columns.is_empty() {
            return Err(PersistenceError::UnknownTable {
                table: table.to_string(),
            });
        }

        Ok(columns.into_iter().map(|c| c.to_uppercase()).collect())
    }
}
