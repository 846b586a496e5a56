//! Source file readers, selected by the job's file type.

pub mod xlsx;
pub mod xml;

use std::path::Path;

use crate::config::FileType;
use crate::error::ReadError;
use crate::model::Row;

pub use xlsx::XlsxReader;
pub use xml::XmlReader;

pub trait RowReader: Send + Sync {
    /// Reads every data row, keeping source column order within each row.
    fn read(&self, path: &Path) -> Result<Vec<Row>, ReadError>;
    fn supports(&self, file_type: FileType) -> bool;
}

/// Ordered set of readers; the first one supporting a file type wins.
pub struct ReaderRegistry {
    readers: Vec<Box<dyn RowReader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self {
            readers: vec![Box::new(XlsxReader::new()), Box::new(XmlReader::new())],
        }
    }

    pub fn empty() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    pub fn with_reader(mut self, reader: Box<dyn RowReader>) -> Self {
        self.readers.push(reader);
        self
    }

    pub fn find(&self, file_type: FileType) -> Option<&dyn RowReader> {
        self.readers
            .iter()
            .find(|r| r.supports(file_type))
            .map(|r| r.as_ref())
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves an XML entity reference name (`amp`, `#233`, `#xE9`) to its text.
pub(crate) fn resolve_entity(name: &str) -> Option<String> {
    let resolved = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)?
        }
    };
    Some(resolved.to_string())
}
