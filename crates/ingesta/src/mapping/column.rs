use std::fmt;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{MappingDefinition, DEFAULT_SEPARATOR};
use crate::error::ConfigError;
use crate::model::{value_to_text, Row};

/// Values the backend generates per row instead of reading them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedValue {
    Uuid,
    Timestamp,
}

impl GeneratedValue {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "UUID" => Some(GeneratedValue::Uuid),
            "TIMESTAMP" | "NOW" => Some(GeneratedValue::Timestamp),
            _ => None,
        }
    }

    fn generate(&self) -> Value {
        match self {
            GeneratedValue::Uuid => Value::String(Uuid::new_v4().to_string()),
            GeneratedValue::Timestamp => Value::String(Utc::now().to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    /// Value of a source header.
    Header(String),
    Constant(String),
    Generated(GeneratedValue),
    /// Non-null values of several headers joined with a separator.
    Concatenate { headers: Vec<String>, separator: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOrigin {
    Auto,
    Explicit,
}

/// Where one target column takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub target: String,
    pub source: MappingSource,
    pub origin: MappingOrigin,
}

impl ColumnMapping {
    pub fn auto(header: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            source: MappingSource::Header(header.into()),
            origin: MappingOrigin::Auto,
        }
    }

    pub fn explicit(target: impl Into<String>, source: MappingSource) -> Self {
        Self {
            target: target.into(),
            source,
            origin: MappingOrigin::Explicit,
        }
    }

    /// Target column in the uppercase form used for matching.
    pub fn target_key(&self) -> String {
        self.target.trim().to_uppercase()
    }

    /// Computes the value this mapping binds for `row`.
    ///
    /// Missing headers resolve to null.
    pub fn resolve_value(&self, row: &Row) -> Value {
        match &self.source {
            MappingSource::Header(header) => row.get(header).cloned().unwrap_or(Value::Null),
            MappingSource::Constant(value) => Value::String(value.clone()),
            MappingSource::Generated(generated) => generated.generate(),
            MappingSource::Concatenate { headers, separator } => {
                let parts: Vec<String> = headers
                    .iter()
                    .filter_map(|h| row.get(h).and_then(value_to_text))
                    .collect();
                if parts.is_empty() {
                    Value::Null
                } else {
                    Value::String(parts.join(separator))
                }
            }
        }
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            MappingSource::Header(header) => write!(f, "{} <- '{}'", self.target, header),
            MappingSource::Constant(value) => write!(f, "{} <- constant '{}'", self.target, value),
            MappingSource::Generated(generated) => write!(f, "{} <- {:?}", self.target, generated),
            MappingSource::Concatenate { headers, .. } => {
                write!(f, "{} <- concat({})", self.target, headers.join(", "))
            }
        }
    }
}

impl TryFrom<&MappingDefinition> for ColumnMapping {
    type Error = ConfigError;

    fn try_from(def: &MappingDefinition) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ConfigError::InvalidMapping {
            column: def.db_column.clone(),
            reason: reason.to_string(),
        };

        if def.db_column.trim().is_empty() {
            return Err(invalid("dbColumn cannot be empty"));
        }
        if def.value_source_count() != 1 {
            return Err(invalid(
                "exactly one of excelColumn, constant, autoGenerate or concatenate is required",
            ));
        }

        let source = if let Some(header) = &def.excel_column {
            MappingSource::Header(header.clone())
        } else if let Some(value) = &def.constant {
            MappingSource::Constant(value.clone())
        } else if let Some(name) = &def.auto_generate {
            let generated = GeneratedValue::parse(name)
                .ok_or_else(|| invalid(&format!("unknown autoGenerate value '{}'", name)))?;
            MappingSource::Generated(generated)
        } else if let Some(headers) = &def.concatenate {
            if headers.is_empty() {
                return Err(invalid("concatenate needs at least one column"));
            }
            MappingSource::Concatenate {
                headers: headers.clone(),
                separator: def
                    .separator
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            }
        } else {
            return Err(invalid("no value source"));
        };

        Ok(ColumnMapping::explicit(def.db_column.trim(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(db_column: &str) -> MappingDefinition {
        MappingDefinition {
            db_column: db_column.to_string(),
            excel_column: None,
            constant: None,
            auto_generate: None,
            concatenate: None,
            separator: None,
        }
    }

    fn sample_row() -> Row {
        vec![
            ("Nombre", json!("Ana")),
            ("Apellido", json!("Pérez")),
            ("Edad", json!(31)),
            ("Notas", json!(null)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_header_mapping_reads_value() {
        let mapping = ColumnMapping::auto("Edad", "EDAD");
        assert_eq!(mapping.resolve_value(&sample_row()), json!(31));
        assert_eq!(mapping.origin, MappingOrigin::Auto);
    }

    #[test]
    fn test_missing_header_is_null() {
        let mapping = ColumnMapping::auto("Email", "EMAIL");
        assert_eq!(mapping.resolve_value(&sample_row()), Value::Null);
    }

    #[test]
    fn test_constant_mapping() {
        let mapping = ColumnMapping::explicit("ORIGEN", MappingSource::Constant("excel".into()));
        assert_eq!(mapping.resolve_value(&sample_row()), json!("excel"));
    }

    #[test]
    fn test_generated_uuid_differs_per_row() {
        let mapping = ColumnMapping::explicit("ID", MappingSource::Generated(GeneratedValue::Uuid));
        let a = mapping.resolve_value(&sample_row());
        let b = mapping.resolve_value(&sample_row());
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_concatenate_skips_nulls() {
        let mapping = ColumnMapping::explicit(
            "COMPLETO",
            MappingSource::Concatenate {
                headers: vec!["Nombre".into(), "Notas".into(), "Apellido".into(), "Edad".into()],
                separator: " ".into(),
            },
        );
        assert_eq!(mapping.resolve_value(&sample_row()), json!("Ana Pérez 31"));
    }

    #[test]
    fn test_try_from_definition() {
        let mut header = def("nombre");
        header.excel_column = Some("Nombre".into());
        let mapping = ColumnMapping::try_from(&header).unwrap();
        assert_eq!(mapping.target, "nombre");
        assert_eq!(mapping.target_key(), "NOMBRE");
        assert_eq!(mapping.source, MappingSource::Header("Nombre".into()));
        assert_eq!(mapping.origin, MappingOrigin::Explicit);

        let mut concat = def("FULL");
        concat.concatenate = Some(vec!["Nombre".into(), "Apellido".into()]);
        let mapping = ColumnMapping::try_from(&concat).unwrap();
        assert_eq!(
            mapping.source,
            MappingSource::Concatenate {
                headers: vec!["Nombre".into(), "Apellido".into()],
                separator: " ".into(),
            }
        );
    }

    #[test]
    fn test_try_from_rejects_bad_definitions() {
        assert!(ColumnMapping::try_from(&def("EMPTY")).is_err());

        let mut two = def("TWO");
        two.excel_column = Some("a".into());
        two.constant = Some("b".into());
        assert!(ColumnMapping::try_from(&two).is_err());

        let mut generator = def("ID");
        generator.auto_generate = Some("SEQUENCE".into());
        let err = ColumnMapping::try_from(&generator).unwrap_err();
        assert!(err.to_string().contains("SEQUENCE"));

        let mut blank = def("  ");
        blank.constant = Some("x".into());
        assert!(ColumnMapping::try_from(&blank).is_err());
    }
}
