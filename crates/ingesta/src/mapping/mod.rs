//! Header normalization and column mapping resolution.

pub mod auto_mapper;
pub mod column;
pub mod normalizer;

pub use auto_mapper::{MappingResolution, SchemaMapper};
pub use column::{ColumnMapping, GeneratedValue, MappingOrigin, MappingSource};
pub use normalizer::normalize;
