use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

use super::{resolve_entity, RowReader};
use crate::config::FileType;
use crate::error::ReadError;
use crate::model::Row;

/// Reads record-oriented XML.
///
/// Every child of the root that has child elements is one row, with each
/// leaf element name mapped to its text. A root holding only leaves is read
/// as a single row.
pub struct XmlReader;

impl XmlReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XmlReader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        for child in &self.children {
            row.insert(child.name.clone(), Value::String(child.text.trim().to_string()));
        }
        row
    }
}

impl RowReader for XmlReader {
    fn read(&self, path: &Path) -> Result<Vec<Row>, ReadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReadError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let Some(root) = parse_tree(&content, path)? else {
            return Ok(Vec::new());
        };

        let records: Vec<&Element> = root.children.iter().filter(|c| !c.is_leaf()).collect();
        if !records.is_empty() {
            return Ok(records.into_iter().map(Element::to_row).collect());
        }
        if root.children.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![root.to_row()])
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Xml)
    }
}

fn parse_tree(xml: &str, path: &Path) -> Result<Option<Element>, ReadError> {
    let malformed = |reason: String| ReadError::Xml {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element {
                name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ..Element::default()
            }),
            Ok(Event::Empty(e)) => {
                let element = Element {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                    ..Element::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unexpected closing tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                let name = String::from_utf8_lossy(&e).into_owned();
                let text = resolve_entity(&name)
                    .ok_or_else(|| malformed(format!("unknown entity '&{};'", name)))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e.to_string())),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unclosed element at end of document".to_string()));
    }

    Ok(root)
}
