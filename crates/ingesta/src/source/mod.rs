//! Source acquisition: making a job's data file available locally.

pub mod local;

use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use log::{debug, warn};

use crate::config::{SourceDefinition, SourceType};
use crate::error::SourceError;

pub use local::LocalFileDownloader;

/// Fetches a job's source file into the working directory.
pub trait FileDownloader: Send + Sync {
    /// Returns the path of the local working copy.
    fn download(&self, source: &SourceDefinition) -> Result<PathBuf, SourceError>;

    fn supports(&self, source_type: SourceType) -> bool;
}

/// Picks the first downloader that supports the source type.
pub fn find_downloader<'a>(
    downloaders: &'a [Box<dyn FileDownloader>],
    source_type: SourceType,
) -> Result<&'a dyn FileDownloader, SourceError> {
    downloaders
        .iter()
        .find(|d| d.supports(source_type))
        .map(|d| d.as_ref())
        .ok_or(SourceError::NoDownloader(source_type))
}

/// Deletes a working copy. Failures are logged, never returned.
pub fn cleanup_working_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed working file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove working file {}: {}", path.display(), e),
    }
}

/// Copies a processed file into `directory` under a date-prefixed name,
/// never overwriting an existing archive.
pub fn archive_source(path: &Path, directory: &Path) -> Result<PathBuf, SourceError> {
    if !directory.exists() {
        std::fs::create_dir_all(directory).map_err(|e| SourceError::CreateDirectory {
            path: directory.to_path_buf(),
            source: e,
        })?;
    }

    let now = Utc::now();
    let date_prefix = format!("{:04}-{:02}-{:02}", now.year(), now.month(), now.day());
    let original_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("source");

    let archive_path = resolve_conflict(directory, &format!("{}_{}", date_prefix, original_name))?;
    std::fs::copy(path, &archive_path).map_err(|e| SourceError::Copy {
        from: path.to_path_buf(),
        to: archive_path.clone(),
        source: e,
    })?;

    Ok(archive_path)
}

fn resolve_conflict(directory: &Path, filename: &str) -> Result<PathBuf, SourceError> {
    let path = directory.join(filename);
    if std::fs::symlink_metadata(&path).is_err() {
        return Ok(path);
    }

    let (base, ext) = match filename.rfind('.') {
        Some(dot) => (&filename[..dot], Some(&filename[dot..])),
        None => (filename, None),
    };

    for counter in 2..=1000 {
        let candidate = match ext {
            Some(ext) => format!("{}_{}{}", base, counter, ext),
            None => format!("{}_{}", base, counter),
        };
        let candidate = directory.join(candidate);
        if std::fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }

    Err(SourceError::FileExists(directory.to_path_buf()))
}
