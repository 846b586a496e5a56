use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

/// Lists job definition files in the jobs directory.
pub struct JobDefinitionScanner {
    jobs_directory: PathBuf,
}

impl JobDefinitionScanner {
    pub fn new<P: AsRef<Path>>(jobs_directory: P) -> Self {
        Self {
            jobs_directory: jobs_directory.as_ref().to_path_buf(),
        }
    }

    pub fn jobs_directory(&self) -> &Path {
        &self.jobs_directory
    }

    /// Returns the `*.yml` / `*.yaml` files at the top level, sorted by path.
    pub fn scan(&self) -> Vec<PathBuf> {
        if !self.jobs_directory.is_dir() {
            warn!(
                "Jobs directory {} does not exist, no jobs to run",
                self.jobs_directory.display()
            );
            return Vec::new();
        }

        let mut definitions: Vec<PathBuf> = WalkDir::new(&self.jobs_directory)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_definition_file(p))
            .collect();
        definitions.sort();

        for path in &definitions {
            debug!("Found job definition: {}", path.display());
        }
        info!(
            "Scanned {} job definitions in {}",
            definitions.len(),
            self.jobs_directory.display()
        );
        definitions
    }
}

fn is_definition_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
        .unwrap_or(false)
}
