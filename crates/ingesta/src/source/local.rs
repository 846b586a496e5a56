use std::path::{Path, PathBuf};

use log::info;

use super::FileDownloader;
use crate::config::{SourceDefinition, SourceType};
use crate::error::SourceError;

/// Copies files from the local filesystem into the working directory.
pub struct LocalFileDownloader {
    working_directory: PathBuf,
}

impl LocalFileDownloader {
    pub fn new<P: AsRef<Path>>(working_directory: P) -> Self {
        Self {
            working_directory: working_directory.as_ref().to_path_buf(),
        }
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}

impl FileDownloader for LocalFileDownloader {
    fn download(&self, source: &SourceDefinition) -> Result<PathBuf, SourceError> {
        let source_path = PathBuf::from(source.location.path.trim());
        info!("Copying local file from {}", source_path.display());

        if !source_path.is_file() {
            return Err(SourceError::NotFound(source_path));
        }

        std::fs::create_dir_all(&self.working_directory).map_err(|e| {
            SourceError::CreateDirectory {
                path: self.working_directory.clone(),
                source: e,
            }
        })?;

        let file_name = source_path
            .file_name()
            .ok_or_else(|| SourceError::NotFound(source_path.clone()))?;
        let target = self.working_directory.join(file_name);

        // fs::copy truncates an existing target, which replaces a stale copy.
        std::fs::copy(&source_path, &target).map_err(|e| SourceError::Copy {
            from: source_path.clone(),
            to: target.clone(),
            source: e,
        })?;

        info!("File copied to working directory: {}", target.display());
        Ok(target)
    }

    fn supports(&self, source_type: SourceType) -> bool {
        source_type == SourceType::Local
    }
}
