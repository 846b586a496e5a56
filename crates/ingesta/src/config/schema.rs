use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// One job definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub source: SourceDefinition,
    pub file_type: FileType,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default)]
    pub parameters: Mapping,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

fn default_true() -> bool {
    true
}

pub const DEFAULT_BATCH_SIZE: i64 = 500;

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE
}

impl JobDefinition {
    /// Batch size with non-positive values replaced by the default.
    pub fn effective_batch_size(&self) -> i64 {
        if self.batch_size > 0 {
            self.batch_size
        } else {
            DEFAULT_BATCH_SIZE
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDefinition {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub location: LocationDefinition,
    #[serde(default)]
    pub location_after_processing: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationDefinition {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub stop_on_failure: bool,
    #[serde(default)]
    pub parameters: Mapping,
    #[serde(default)]
    pub subtasks: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub parameters: Mapping,
}

/// Format of the source file, which selects the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Excel,
    Xml,
}

impl FileType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EXCEL" | "XLSX" => Some(FileType::Excel),
            "XML" => Some(FileType::Xml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Excel => "EXCEL",
            FileType::Xml => "XML",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FileType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let name = String::deserialize(deserializer)?;
        FileType::parse(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown file type '{}'", name)))
    }
}

/// Where a job's source file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Local,
    Sharepoint,
}

impl SourceType {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "LOCAL" | "FILESYSTEM" => Some(SourceType::Local),
            "SHAREPOINT" => Some(SourceType::Sharepoint),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Local => "LOCAL",
            SourceType::Sharepoint => "SHAREPOINT",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let name = String::deserialize(deserializer)?;
        SourceType::parse(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown source type '{}'", name)))
    }
}

pub const DEFAULT_TABLE_NAME: &str = "ingesta_data";
pub const DEFAULT_SEPARATOR: &str = " ";

/// Typed parameters of a step, after merging job, task and step layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepParameters {
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_true")]
    pub auto_map: bool,
    #[serde(default)]
    pub mappings: Vec<MappingDefinition>,
    /// Query run by SELECT steps.
    #[serde(default)]
    pub query: Option<String>,
    /// CONCATENATE step inputs.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub target_column: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl Default for StepParameters {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            schema: None,
            auto_map: true,
            mappings: Vec::new(),
            query: None,
            columns: Vec::new(),
            separator: None,
            target_column: None,
            extra: BTreeMap::new(),
        }
    }
}

impl StepParameters {
    /// Merges parameter layers (later layers win key by key) and types the
    /// result.
    pub fn from_layers(step: &str, layers: &[&Mapping]) -> Result<Self, ConfigError> {
        let merged = merge_parameters(layers);
        serde_yaml::from_value(Value::Mapping(merged)).map_err(|source| {
            ConfigError::InvalidParameters {
                step: step.to_string(),
                source,
            }
        })
    }

    pub fn separator_or_default(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }
}

pub fn merge_parameters(layers: &[&Mapping]) -> Mapping {
    let mut merged = Mapping::new();
    for layer in layers {
        for (key, value) in layer.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Explicit column mapping as written in a definition.
///
/// Exactly one of `excelColumn`, `constant`, `autoGenerate` or `concatenate`
/// supplies the value for `dbColumn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDefinition {
    pub db_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excel_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concatenate: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl MappingDefinition {
    pub fn value_source_count(&self) -> usize {
        [
            self.excel_column.is_some(),
            self.constant.is_some(),
            self.auto_generate.is_some(),
            self.concatenate.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}
