//! Test harness for isolated ingestion runs.
//!
//! Each `TestHarness` owns a temp directory laid out like a real install:
//! jobs, input, work and archive directories plus a SQLite database file.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use ingesta::config::{JobDefinition, Settings};
use ingesta::db::{Database, DatabaseError};
use ingesta::IngestionService;

pub struct TestHarness {
    temp_dir: TempDir,
    pub jobs_dir: PathBuf,
    pub input_dir: PathBuf,
    pub work_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub db_path: PathBuf,
    database: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let jobs_dir = base.join("jobs");
        let input_dir = base.join("input");
        let work_dir = base.join("work");
        let archive_dir = base.join("processed");
        let db_path = base.join("data").join("ingesta.db");

        std::fs::create_dir_all(&jobs_dir).expect("Failed to create jobs dir");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        let database = Database::open(&db_path).expect("Failed to open database");

        Self {
            temp_dir,
            jobs_dir,
            input_dir,
            work_dir,
            archive_dir,
            db_path,
            database,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            jobs_directory: self.jobs_dir.clone(),
            working_directory: self.work_dir.clone(),
            database_path: self.db_path.clone(),
            ..Settings::default()
        }
    }

    /// A service wired to this harness' directories and database.
    pub fn service(&self) -> IngestionService {
        IngestionService::with_database(&self.settings(), self.database.clone())
    }

    pub fn write_input(&self, filename: &str, content: &[u8]) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn write_job(&self, filename: &str, definition: &JobDefinition) -> PathBuf {
        let yaml = serde_yaml::to_string(definition).expect("Failed to serialize job definition");
        self.write_job_yaml(filename, &yaml)
    }

    pub fn write_job_yaml(&self, filename: &str, yaml: &str) -> PathBuf {
        let path = self.jobs_dir.join(filename);
        std::fs::write(&path, yaml).expect("Failed to write job definition");
        path
    }

    pub fn execute_sql(&self, sql: &str) {
        self.database
            .with_conn(|conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .expect("Failed to execute SQL");
    }

    /// Runs a query and returns every row as JSON values, column by column.
    pub fn query(&self, sql: &str) -> Vec<Vec<Value>> {
        self.database
            .with_conn(|conn| {
                let mut stmt = conn.prepare(sql)?;
                let columns = stmt.column_count();
                let rows = stmt
                    .query_map([], |row| {
                        (0..columns)
                            .map(|i| {
                                let value: rusqlite::types::Value = row.get(i)?;
                                Ok(match value {
                                    rusqlite::types::Value::Null => Value::Null,
                                    rusqlite::types::Value::Integer(n) => Value::from(n),
                                    rusqlite::types::Value::Real(f) => Value::from(f),
                                    rusqlite::types::Value::Text(s) => Value::from(s),
                                    rusqlite::types::Value::Blob(b) => Value::from(b),
                                })
                            })
                            .collect::<Result<Vec<_>, rusqlite::Error>>()
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, DatabaseError>(rows)
            })
            .expect("Failed to run query")
    }

    pub fn working_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.work_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn archived_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.archive_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
