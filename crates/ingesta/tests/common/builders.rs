//! Builders for job definitions and spreadsheet fixtures.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use serde_yaml::Mapping;

use ingesta::config::{
    FileType, JobDefinition, LocationDefinition, SourceDefinition, SourceType, StepDefinition,
    TaskDefinition,
};

/// Parses a YAML snippet into a parameter mapping.
pub fn params(yaml: &str) -> Mapping {
    serde_yaml::from_str(yaml).expect("Invalid parameter YAML")
}

/// Builder for `JobDefinition` instances.
pub struct JobBuilder {
    definition: JobDefinition,
}

impl JobBuilder {
    pub fn new(name: &str, file_type: FileType, source_path: &str) -> Self {
        Self {
            definition: JobDefinition {
                name: name.to_string(),
                description: String::new(),
                enabled: true,
                source: SourceDefinition {
                    source_type: SourceType::Local,
                    location: LocationDefinition {
                        path: source_path.to_string(),
                        ..LocationDefinition::default()
                    },
                    location_after_processing: None,
                },
                file_type,
                batch_size: 500,
                parameters: Mapping::new(),
                tasks: Vec::new(),
            },
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.definition.enabled = enabled;
        self
    }

    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.definition.source.source_type = source_type;
        self
    }

    pub fn archive_to(mut self, directory: &str) -> Self {
        self.definition.source.location_after_processing = Some(directory.to_string());
        self
    }

    pub fn parameters(mut self, yaml: &str) -> Self {
        self.definition.parameters = params(yaml);
        self
    }

    pub fn task(mut self, task: TaskBuilder) -> Self {
        self.definition.tasks.push(task.build());
        self
    }

    pub fn build(self) -> JobDefinition {
        self.definition
    }
}

/// Builder for `TaskDefinition` instances.
pub struct TaskBuilder {
    task: TaskDefinition,
}

impl TaskBuilder {
    pub fn transformation(name: &str, order: i32) -> Self {
        Self::new(name, order, "TRANSFORMATION")
    }

    pub fn persistence(name: &str, order: i32) -> Self {
        Self::new(name, order, "PERSISTENCE")
    }

    fn new(name: &str, order: i32, task_type: &str) -> Self {
        Self {
            task: TaskDefinition {
                name: name.to_string(),
                order,
                task_type: task_type.to_string(),
                stop_on_failure: false,
                parameters: Mapping::new(),
                subtasks: Vec::new(),
            },
        }
    }

    pub fn stop_on_failure(mut self) -> Self {
        self.task.stop_on_failure = true;
        self
    }

    pub fn parameters(mut self, yaml: &str) -> Self {
        self.task.parameters = params(yaml);
        self
    }

    /// Adds a step; its order follows insertion order.
    pub fn step(self, step_type: &str) -> Self {
        self.step_with(step_type, "{}")
    }

    pub fn step_with(mut self, step_type: &str, parameters: &str) -> Self {
        let order = self.task.subtasks.len() as i32 + 1;
        self.task.subtasks.push(StepDefinition {
            name: format!("{}-{}", step_type.to_lowercase(), order),
            order,
            step_type: step_type.to_string(),
            parameters: params(parameters),
        });
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}

/// One spreadsheet cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}

/// Builds a minimal single-sheet XLSX workbook with inline strings.
#[derive(Default)]
pub struct XlsxBuilder {
    rows: Vec<Vec<Cell>>,
}

impl XlsxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("xl/worksheets/sheet1.xml", options)
            .expect("Failed to start sheet entry");
        zip.write_all(self.sheet_xml().as_bytes())
            .expect("Failed to write sheet");

        zip.finish().expect("Failed to finish workbook").into_inner()
    }

    fn sheet_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (r, row) in self.rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", column_letters(c), r + 1);
                match cell {
                    Cell::Text(text) => xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference,
                        escape(text)
                    )),
                    Cell::Number(n) => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n))
                    }
                    Cell::Empty => {}
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
