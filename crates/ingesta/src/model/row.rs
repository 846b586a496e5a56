use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record read from a source file: header -> value, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, header: &str) -> Option<&Value> {
        self.0.get(header)
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(header.into(), value.into());
    }

    pub fn contains(&self, header: &str) -> bool {
        self.0.contains_key(header)
    }

    pub fn headers(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Rewrites every string value in place; other values are left alone.
    pub fn map_strings<F>(&mut self, f: F)
    where
        F: Fn(&str) -> String,
    {
        for value in self.0.values_mut() {
            if let Value::String(s) = value {
                *s = f(s);
            }
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Renders a cell value the way it would appear in the source file.
///
/// Returns `None` for null cells.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
