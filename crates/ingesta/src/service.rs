//! End-to-end ingestion run: scan, load, prepare, process, report.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, info_span, warn};

use crate::config::{load_job_definition, JobDefinition, JobDefinitionScanner, Settings};
use crate::db::Database;
use crate::error::{IngestaError, Result};
use crate::factory::JobFactory;
use crate::mapping::SchemaMapper;
use crate::model::{Job, Lifecycle, LogEntry, Status};
use crate::persistence::{Persistence, SchemaIntrospector, SqliteBackend};
use crate::pipeline::JobProcessor;
use crate::reader::ReaderRegistry;
use crate::report::{collect, LogNotifier, Notifier, ProcessReport, ReportStore};
use crate::sanitize;
use crate::source::{self, FileDownloader, LocalFileDownloader};

/// How a run was triggered and which jobs it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteCommand {
    pub manually_triggered: bool,
    /// Job names to run; empty runs every enabled job.
    pub job_filter: Vec<String>,
}

impl ExecuteCommand {
    pub fn from_scheduler() -> Self {
        Self {
            manually_triggered: false,
            job_filter: Vec::new(),
        }
    }

    pub fn manual(job_filter: Vec<String>) -> Self {
        Self {
            manually_triggered: true,
            job_filter,
        }
    }

    pub fn should_run_all(&self) -> bool {
        self.job_filter.is_empty()
    }

    pub fn accepts(&self, job_name: &str) -> bool {
        self.should_run_all() || self.job_filter.iter().any(|n| n == job_name)
    }
}

/// Files a prepared job owns outside the engine.
#[derive(Default)]
struct JobFiles {
    working_copy: Option<PathBuf>,
    archive_directory: Option<PathBuf>,
}

pub struct IngestionService {
    scanner: JobDefinitionScanner,
    downloaders: Vec<Box<dyn FileDownloader>>,
    factory: JobFactory,
    processor: JobProcessor,
    store: ReportStore,
    notifier: Box<dyn Notifier>,
}

impl IngestionService {
    pub fn new(
        scanner: JobDefinitionScanner,
        downloaders: Vec<Box<dyn FileDownloader>>,
        processor: JobProcessor,
        store: ReportStore,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            scanner,
            downloaders,
            factory: JobFactory::new(),
            processor,
            store,
            notifier,
        }
    }

    /// Wires the default adapters: local downloads, the built-in readers,
    /// the SQLite backend at `database_path` and log notifications.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let database = Database::open(&settings.database_path)?;
        Ok(Self::with_database(settings, database))
    }

    pub fn with_database(settings: &Settings, database: Database) -> Self {
        let backend = Arc::new(SqliteBackend::new(database));
        let persistence: Arc<dyn Persistence> = backend.clone();
        let introspector: Arc<dyn SchemaIntrospector> = backend;

        let processor = JobProcessor::new(
            ReaderRegistry::new(),
            persistence,
            SchemaMapper::new(introspector),
        );

        Self::new(
            JobDefinitionScanner::new(&settings.jobs_directory),
            vec![Box::new(LocalFileDownloader::new(&settings.working_directory))],
            processor,
            ReportStore::new(),
            Box::new(LogNotifier),
        )
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Runs every selected job and returns the batch report. Individual job
    /// failures end up in the report, never as an error.
    pub fn execute(&self, command: &ExecuteCommand) -> ProcessReport {
        let _run_span = info_span!("ingestion",
            manual = command.manually_triggered,
            filter = ?command.job_filter,
        )
        .entered();
        info!("Starting ingestion run");

        let definitions = self.load_definitions(command);
        info!(count = definitions.len(), "Job definitions selected");

        let mut jobs = Vec::with_capacity(definitions.len());
        let mut files = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            let (job, job_files) = self.prepare(definition);
            jobs.push(job);
            files.push(job_files);
        }

        self.processor.process(&mut jobs);

        let report = collect(&jobs, command.manually_triggered);

        if let Err(e) = self.store.save(report.clone()) {
            warn!(error = %e, "Failed to store report");
        }
        if let Err(e) = self.notifier.notify(&report) {
            warn!(error = %e, "Failed to send notification");
        }

        for (job, job_files) in jobs.iter().zip(&files) {
            finish_files(job, job_files);
        }

        info!(
            status = %report.status,
            duration_ms = report.total_duration_ms,
            "Ingestion run completed"
        );
        report
    }

    fn load_definitions(&self, command: &ExecuteCommand) -> Vec<JobDefinition> {
        let paths = self.scanner.scan();
        info!(count = paths.len(), "Found job definition files");

        paths
            .iter()
            .filter_map(|path| match load_job_definition(path) {
                Ok(definition) => Some(definition),
                Err(e) => {
                    error!(file = %sanitize::redact_path(path), error = %e, "Skipping invalid job definition");
                    None
                }
            })
            .filter(|d| d.enabled)
            .filter(|d| command.accepts(&d.name))
            .collect()
    }

    fn prepare(&self, definition: &JobDefinition) -> (Job, JobFiles) {
        let _prepare_span = info_span!("prepare",
            job = %definition.name,
            location = %sanitize::redact_location(&definition.source.location.path),
        )
        .entered();

        match self.try_prepare(definition) {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(error = %err, "Failed to prepare job");
                (failed_job(definition, &err), JobFiles::default())
            }
        }
    }

    fn try_prepare(&self, definition: &JobDefinition) -> Result<(Job, JobFiles)> {
        let downloader = source::find_downloader(&self.downloaders, definition.source.source_type)?;
        let working_copy = downloader.download(&definition.source)?;

        let files = JobFiles {
            working_copy: Some(working_copy.clone()),
            archive_directory: definition
                .source
                .location_after_processing
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
        };

        if !self.factory.can_load_file(&working_copy) {
            let reason = format!("Data file could not be loaded: {}", working_copy.display());
            warn!("{}", reason);
            return Ok((self.factory.skipped_job(definition, &reason), files));
        }

        let job = self.factory.create_job(definition, working_copy)?;
        Ok((job, files))
    }
}

/// A job that failed before processing: started, logged and closed as
/// `FAILED` so it still shows up in the report.
fn failed_job(definition: &JobDefinition, err: &IngestaError) -> Job {
    let mut job = Job::new(
        definition.name.clone(),
        definition.source.location.path.clone(),
        definition.file_type,
    );
    let closed = job.start().and_then(|()| {
        job.add_log(LogEntry::from_error(
            definition.name.clone(),
            "Failed to prepare job",
            err,
        ));
        job.complete(Status::Failed)
    });
    if let Err(e) = closed {
        warn!(error = %e, "Could not close failed job");
    }
    job
}

/// Archives the working copy of a successful job, then removes it.
fn finish_files(job: &Job, files: &JobFiles) {
    let Some(working_copy) = &files.working_copy else {
        return;
    };

    if job.status() == Status::Success {
        if let Some(directory) = &files.archive_directory {
            match source::archive_source(working_copy, directory) {
                Ok(path) => info!(job = %job.name(), archive = %sanitize::redact_path(&path), "Source archived"),
                Err(e) => warn!(job = %job.name(), error = %e, "Failed to archive source"),
            }
        }
    }

    source::cleanup_working_file(working_copy);
}
