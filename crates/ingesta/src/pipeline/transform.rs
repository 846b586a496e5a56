use serde_json::Value;

use crate::model::{value_to_text, Row};

pub fn trim_all(rows: &mut [Row]) {
    for row in rows {
        row.map_strings(|s| s.trim().to_string());
    }
}

pub fn uppercase_all(rows: &mut [Row]) {
    for row in rows {
        row.map_strings(str::to_uppercase);
    }
}

/// Writes the non-null values of `columns`, joined by `separator`, into
/// `target`. Rows where every input is null or missing get a null target.
pub fn concatenate_all(rows: &mut [Row], columns: &[String], separator: &str, target: &str) {
    for row in rows {
        let parts: Vec<String> = columns
            .iter()
            .filter_map(|c| row.get(c).and_then(value_to_text))
            .collect();
        let value = if parts.is_empty() {
            Value::Null
        } else {
            Value::String(parts.join(separator))
        };
        row.insert(target, value);
    }
}
