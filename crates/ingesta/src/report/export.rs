use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ProcessReport;
use crate::error::ExportError;

const CSV_HEADER: &str =
    "Job Name,File Path,File Type,Status,Duration (ms),Records Processed,Records Failed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Renders the report as UTF-8 bytes: one CSV line per job, or the whole
/// report as pretty JSON.
pub fn export(report: &ProcessReport, format: ReportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ReportFormat::Csv => Ok(to_csv(report).into_bytes()),
        ReportFormat::Json => {
            let mut json = serde_json::to_vec_pretty(report)?;
            json.push(b'\n');
            Ok(json)
        }
    }
}

pub fn write_report(
    report: &ProcessReport,
    format: ReportFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let content = export(report, format)?;
    std::fs::write(path, content).map_err(|e| ExportError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

fn to_csv(report: &ProcessReport) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for job in &report.jobs {
        let fields = [
            csv_field(&job.name),
            csv_field(&job.file_path),
            job.file_type.to_string(),
            job.status.to_string(),
            job.duration_ms.to_string(),
            job.records_processed.to_string(),
            job.records_failed.to_string(),
        ];
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

/// Quotes a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
