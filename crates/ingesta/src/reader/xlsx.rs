use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Number, Value};

use super::{resolve_entity, RowReader};
use crate::config::FileType;
use crate::error::ReadError;
use crate::model::Row;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";

/// Reads the first worksheet of an `.xlsx` workbook.
///
/// A first row made only of text cells becomes the header; otherwise every
/// row is data and columns are named `column_<index>`.
pub struct XlsxReader;

impl XlsxReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxReader {
    fn default() -> Self {
        Self::new()
    }
}

impl RowReader for XlsxReader {
    fn read(&self, path: &Path) -> Result<Vec<Row>, ReadError> {
        let file = File::open(path).map_err(|e| ReadError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| ReadError::Archive {
            path: path.to_path_buf(),
            source: e,
        })?;

        let shared = match read_entry(&mut archive, SHARED_STRINGS, path)? {
            Some(xml) => parse_shared_strings(&xml, path)?,
            None => Vec::new(),
        };

        let missing = || ReadError::MissingWorksheet {
            path: path.to_path_buf(),
        };
        let sheet = first_sheet_name(&mut archive, path)?.ok_or_else(missing)?;
        let sheet_xml = read_entry(&mut archive, &sheet, path)?.ok_or_else(missing)?;

        let cells = parse_sheet(&sheet_xml, &shared, path)?;
        Ok(rows_from_cells(cells))
    }

    fn supports(&self, file_type: FileType) -> bool {
        matches!(file_type, FileType::Excel)
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<Option<String>, ReadError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ReadError::Archive {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ReadError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(Some(content))
}

fn xml_error(path: &Path, e: impl std::fmt::Display) -> ReadError {
    ReadError::Xml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn attribute(element: &BytesStart, local: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Resolves the part name of the first sheet listed in the workbook, falling
/// back to the lowest-numbered worksheet part.
fn first_sheet_name<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    path: &Path,
) -> Result<Option<String>, ReadError> {
    let workbook = read_entry(archive, WORKBOOK, path)?;
    let rels = read_entry(archive, WORKBOOK_RELS, path)?;

    if let (Some(workbook), Some(rels)) = (workbook, rels) {
        if let Some(target) = first_sheet_target(&workbook, &rels, path)? {
            let name = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            if archive.file_names().any(|n| n == name) {
                return Ok(Some(name));
            }
        }
    }

    let mut sheets: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml"))
        .map(String::from)
        .collect();
    sheets.sort_by_key(|n| sheet_number(n));
    Ok(sheets.into_iter().next())
}

fn sheet_number(name: &str) -> u32 {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(u32::MAX)
}

fn first_sheet_target(workbook: &str, rels: &str, path: &Path) -> Result<Option<String>, ReadError> {
    let mut rel_id = None;
    let mut reader = Reader::from_str(workbook);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                rel_id = attribute(&e, b"id");
                break;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }
    let Some(rel_id) = rel_id else {
        return Ok(None);
    };

    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship"
                    && attribute(&e, b"Id").as_deref() == Some(rel_id.as_str()) =>
            {
                return Ok(attribute(&e, b"Target"));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }
}

fn parse_shared_strings(xml: &str, path: &Path) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text && !in_phonetic => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) if in_text && !in_phonetic => {
                if let (Some(s), Some(text)) =
                    (current.as_mut(), resolve_entity(&String::from_utf8_lossy(&e)))
                {
                    s.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }

    Ok(strings)
}

struct PendingCell {
    column: usize,
    kind: Option<String>,
    text: String,
}

impl PendingCell {
    fn into_value(self, shared: &[String]) -> Option<Value> {
        let text = self.text;
        match self.kind.as_deref() {
            Some("s") => {
                let index: usize = text.trim().parse().ok()?;
                shared.get(index).cloned().map(Value::String)
            }
            Some("b") => Some(Value::Bool(text.trim() == "1")),
            Some("str") | Some("inlineStr") => Some(Value::String(text)),
            Some("e") => None,
            _ => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                Some(number_value(trimmed).unwrap_or_else(|| Value::String(text.clone())))
            }
        }
    }
}

/// Whole numbers become JSON integers, other numbers floats.
fn number_value(text: &str) -> Option<Value> {
    let number: f64 = text.parse().ok()?;
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        Some(Value::from(number as i64))
    } else {
        Number::from_f64(number).map(Value::Number)
    }
}

/// Zero-based column index of a cell reference such as `B12`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let index = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    Some(index - 1)
}

type CellRow = Vec<(usize, Value)>;

fn parse_sheet(xml: &str, shared: &[String], path: &Path) -> Result<Vec<CellRow>, ReadError> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut current: CellRow = Vec::new();
    let mut cell: Option<PendingCell> = None;
    let mut capture = false;
    let mut next_column = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current.clear();
                    next_column = 0;
                }
                b"c" => {
                    let column = attribute(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column);
                    cell = Some(PendingCell {
                        column,
                        kind: attribute(&e, b"t"),
                        text: String::new(),
                    });
                }
                b"v" | b"t" => capture = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"c" {
                    next_column = attribute(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column)
                        + 1;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let column = pending.column;
                        next_column = column + 1;
                        if let Some(value) = pending.into_value(shared) {
                            current.push((column, value));
                        }
                    }
                }
                b"row" => {
                    if !current.is_empty() {
                        rows.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if capture => {
                if let Some(pending) = cell.as_mut() {
                    pending.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(e)) if capture => {
                if let (Some(pending), Some(text)) =
                    (cell.as_mut(), resolve_entity(&String::from_utf8_lossy(&e)))
                {
                    pending.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }

    Ok(rows)
}

fn generated_header(column: usize) -> String {
    format!("column_{}", column)
}

fn rows_from_cells(mut cell_rows: Vec<CellRow>) -> Vec<Row> {
    let Some(first) = cell_rows.first() else {
        return Vec::new();
    };

    if !first.iter().all(|(_, v)| v.is_string()) {
        return cell_rows
            .into_iter()
            .map(|cells| {
                cells
                    .into_iter()
                    .map(|(column, value)| (generated_header(column), value))
                    .collect()
            })
            .collect();
    }

    let headers: BTreeMap<usize, String> = cell_rows
        .remove(0)
        .into_iter()
        .map(|(column, value)| {
            let name = match value {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => generated_header(column),
            };
            (column, name)
        })
        .collect();

    cell_rows
        .into_iter()
        .map(|cells| {
            let mut values: BTreeMap<usize, Value> = cells.into_iter().collect();
            let mut row = Row::new();
            for (column, header) in &headers {
                row.insert(header.clone(), values.remove(column).unwrap_or(Value::Null));
            }
            for (column, value) in values {
                row.insert(generated_header(column), value);
            }
            row
        })
        .collect()
}
