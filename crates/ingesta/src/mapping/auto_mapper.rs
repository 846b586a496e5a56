use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::column::ColumnMapping;
use super::normalizer::normalize;
use crate::error::PersistenceError;
use crate::persistence::SchemaIntrospector;

/// Outcome of reconciling source headers with a target table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingResolution {
    /// Auto mappings in header order, followed by the explicit mappings.
    pub mappings: Vec<ColumnMapping>,
    /// Headers whose normalized form matched no target column.
    pub unmatched_headers: Vec<String>,
    /// Target columns no mapping writes to.
    pub unmapped_columns: Vec<String>,
}

impl MappingResolution {
    /// Resolution made only of explicit mappings, without consulting the schema.
    pub fn explicit_only(explicit: Vec<ColumnMapping>) -> Self {
        Self {
            mappings: explicit,
            ..Self::default()
        }
    }

    pub fn auto_count(&self) -> usize {
        self.mappings
            .iter()
            .filter(|m| m.origin == super::column::MappingOrigin::Auto)
            .count()
    }
}

/// Matches source headers against target columns by normalized name.
#[derive(Clone)]
pub struct SchemaMapper {
    introspector: Arc<dyn SchemaIntrospector>,
}

impl SchemaMapper {
    pub fn new(introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self { introspector }
    }

    /// Resolves the mappings for one persistence step.
    ///
    /// Target columns claimed by an explicit mapping are never auto-mapped.
    /// When two headers normalize to the same column, the first one wins.
    pub fn resolve(
        &self,
        source_headers: &[String],
        table: &str,
        schema: Option<&str>,
        explicit: Vec<ColumnMapping>,
    ) -> Result<MappingResolution, PersistenceError> {
        let target_columns: Vec<String> = self
            .introspector
            .column_names(table, schema)?
            .into_iter()
            .map(|c| c.to_uppercase())
            .collect();
        let target_set: HashSet<&str> = target_columns.iter().map(String::as_str).collect();

        let mut claimed: HashSet<String> = explicit.iter().map(ColumnMapping::target_key).collect();

        let mut auto = Vec::new();
        let mut unmatched_headers = Vec::new();
        for header in source_headers {
            let Some(normalized) = normalize(header) else {
                continue;
            };

            if !target_set.contains(normalized.as_str()) {
                debug!(header = %header, normalized = %normalized, "Header matches no target column");
                unmatched_headers.push(header.clone());
                continue;
            }

            if claimed.insert(normalized.clone()) {
                auto.push(ColumnMapping::auto(header.clone(), normalized));
            }
        }

        let unmapped_columns: Vec<String> = target_columns
            .iter()
            .filter(|c| !claimed.contains(c.as_str()))
            .cloned()
            .collect();

        if !unmatched_headers.is_empty() {
            warn!(
                table = %table,
                headers = ?unmatched_headers,
                "Source headers without a target column"
            );
        }
        if !unmapped_columns.is_empty() {
            debug!(table = %table, columns = ?unmapped_columns, "Target columns left unmapped");
        }
        info!(
            table = %table,
            auto = auto.len(),
            explicit = explicit.len(),
            "Column mappings resolved"
        );

        let mut mappings = auto;
        mappings.extend(explicit);

        Ok(MappingResolution {
            mappings,
            unmatched_headers,
            unmapped_columns,
        })
    }
}
