use std::sync::Arc;

use tracing::{error, info, info_span, warn};

use crate::mapping::{ColumnMapping, MappingResolution, SchemaMapper};
use crate::model::{Job, Lifecycle, LogEntry, Status, Step, StepKind, Task, TaskKind};
use crate::persistence::Persistence;
use crate::reader::ReaderRegistry;
use crate::sanitize;

use super::context::{JobContext, RowTally};
use super::error::{JobError, StepError};
use super::transform;

/// What a successful step did to the row buffer or the store.
enum StepEffect {
    Transformed,
    Persisted(u64),
    Nothing,
}

/// Runs jobs: reads their rows, then executes each task and step in order.
///
/// A failing step fails its task; a failing task stops the job only when it
/// is marked `stop_on_failure`. Failures never escape `process`.
pub struct JobProcessor {
    readers: ReaderRegistry,
    persistence: Arc<dyn Persistence>,
    mapper: SchemaMapper,
}

impl JobProcessor {
    pub fn new(readers: ReaderRegistry, persistence: Arc<dyn Persistence>, mapper: SchemaMapper) -> Self {
        Self {
            readers,
            persistence,
            mapper,
        }
    }

    /// Processes the jobs strictly in order, mutating each in place.
    pub fn process(&self, jobs: &mut [Job]) {
        for job in jobs.iter_mut() {
            self.process_job(job);
        }
    }

    pub fn process_job(&self, job: &mut Job) {
        let filename = sanitize::redact_path(job.file_path());
        let _job_span = info_span!("job",
            job_id = %job.id(),
            name = %job.name(),
            filename = %filename,
        )
        .entered();

        match job.status() {
            Status::Pending => {}
            Status::Skipped => {
                info!("Job was skipped before execution");
                return;
            }
            other => {
                warn!(status = %other, "Job is not pending, leaving it untouched");
                return;
            }
        }

        if let Err(e) = job.start() {
            warn!(error = %e, "Job could not be started");
            return;
        }

        if let Err(err) = self.run_job(job) {
            error!(error = %err, "Job failed");
            let entry = LogEntry::from_error(job.name(), "Job failed", &err);
            job.add_log(entry);
            if job.status() == Status::Running {
                if let Err(e) = job.complete(Status::Failed) {
                    warn!(error = %e, "Failed job could not be completed");
                }
            }
        }

        info!(
            status = %job.status(),
            duration_ms = job.metrics().duration_ms(),
            processed = job.metrics().records_processed(),
            failed = job.metrics().records_failed(),
            "Job finished"
        );
    }

    fn run_job(&self, job: &mut Job) -> Result<(), JobError> {
        let reader = self
            .readers
            .find(job.file_type())
            .ok_or(JobError::NoReader(job.file_type()))?;

        let rows = {
            let _read_span = info_span!("read_rows", file_type = %job.file_type()).entered();
            reader.read(job.file_path())?
        };
        let mut ctx = JobContext::new(rows);

        job.metrics_mut()
            .add_custom_metric("totalRowsRead", ctx.row_count());
        let entry = LogEntry::info(job.name(), format!("Read {} rows from source", ctx.row_count()))
            .with_context("headers", ctx.headers.len());
        job.add_log(entry);

        for index in 0..job.tasks().len() {
            let (tally, result) = self.run_task(&mut job.tasks_mut()[index], &mut ctx);

            job.metrics_mut().increment_processed(tally.persisted);
            job.metrics_mut().increment_failed(tally.failed);

            let Err(err) = result else {
                continue;
            };
            let task_name = job.tasks()[index].name().to_string();
            let entry = LogEntry::from_error(job.name(), format!("Task '{}' failed", task_name), &err);
            job.add_log(entry);

            if job.tasks()[index].stop_on_failure() {
                error!(task = %task_name, "Task failed with stopOnFailure set, halting job");
                let entry = LogEntry::error(
                    job.name(),
                    format!("Halting job: task '{}' failed and stopOnFailure is set", task_name),
                );
                job.add_log(entry);
                break;
            }
        }

        let status = terminal_status(job.tasks());
        job.complete(status)?;
        Ok(())
    }

    /// Runs one task to a terminal status. The task is always completed,
    /// whatever its steps do.
    fn run_task(&self, task: &mut Task, ctx: &mut JobContext) -> (RowTally, Result<(), JobError>) {
        let _task_span = info_span!("task",
            name = %task.name(),
            kind = %task.kind(),
            order = task.order(),
        )
        .entered();

        let mut tally = RowTally::default();

        if let Err(e) = task.start() {
            warn!(error = %e, "Task could not be started");
            return (tally, Err(e.into()));
        }

        let kind = task.kind();
        let mut result = Ok(());
        for step in task.steps_mut() {
            if let Err(err) = self.run_step(kind, step, ctx, &mut tally) {
                result = Err(err);
                break;
            }
        }

        task.metrics_mut().increment_processed(tally.persisted);
        task.metrics_mut().increment_failed(tally.failed);

        let status = match &result {
            Ok(()) => {
                if kind == TaskKind::Transformation {
                    task.metrics_mut().increment_processed(ctx.row_count());
                }
                Status::Success
            }
            Err(err) => {
                error!(error = %err, "Task failed");
                let entry = LogEntry::from_error(task.name(), "Task failed", err);
                task.add_log(entry);
                Status::Failed
            }
        };

        if task.status() == Status::Running {
            if let Err(e) = task.complete(status) {
                warn!(error = %e, "Task could not be completed");
            }
        }

        (tally, result)
    }

    fn run_step(
        &self,
        task_kind: TaskKind,
        step: &mut Step,
        ctx: &mut JobContext,
        tally: &mut RowTally,
    ) -> Result<(), JobError> {
        let _step_span = info_span!("step",
            name = %step.name(),
            kind = %step.kind(),
        )
        .entered();

        step.start()?;

        let outcome = match task_kind {
            TaskKind::Transformation => Ok(self.apply_transformation(step, ctx)),
            TaskKind::Persistence => self.apply_persistence(step, ctx),
        };

        match outcome {
            Ok(effect) => {
                match effect {
                    StepEffect::Transformed => step.metrics_mut().increment_processed(ctx.row_count()),
                    StepEffect::Persisted(count) => {
                        step.metrics_mut().increment_processed(count);
                        tally.persisted += count;
                    }
                    StepEffect::Nothing => {}
                }
                step.complete(Status::Success)?;
                Ok(())
            }
            Err(err) => {
                if *step.kind() == StepKind::Insert {
                    step.metrics_mut().increment_failed(ctx.row_count());
                    tally.failed += ctx.row_count();
                }
                error!(error = %err, "Step failed");
                let entry = LogEntry::from_error(step.name(), "Step failed", &err);
                step.add_log(entry);
                step.complete(Status::Failed)?;
                Err(JobError::Step {
                    step: step.name().to_string(),
                    source: err,
                })
            }
        }
    }

    fn apply_transformation(&self, step: &mut Step, ctx: &mut JobContext) -> StepEffect {
        match step.kind().clone() {
            StepKind::Trim => {
                transform::trim_all(&mut ctx.rows);
                StepEffect::Transformed
            }
            StepKind::Uppercase => {
                transform::uppercase_all(&mut ctx.rows);
                StepEffect::Transformed
            }
            StepKind::Concatenate => {
                let params = step.parameters();
                let columns = params.columns.clone();
                let separator = params.separator_or_default().to_string();
                let target = params
                    .target_column
                    .clone()
                    .filter(|t| !t.trim().is_empty() && !columns.is_empty());
                let Some(target) = target else {
                    warn!("CONCATENATE step has no columns or targetColumn, nothing to do");
                    let entry = LogEntry::warn(
                        step.name(),
                        "CONCATENATE step needs 'columns' and 'targetColumn'; no-op",
                    );
                    step.add_log(entry);
                    return StepEffect::Nothing;
                };
                transform::concatenate_all(&mut ctx.rows, &columns, &separator, &target);

                let entry = LogEntry::info(
                    step.name(),
                    format!("Concatenated {} columns into '{}'", columns.len(), target),
                );
                step.add_log(entry);
                StepEffect::Transformed
            }
            other => {
                self.unsupported_step(step, TaskKind::Transformation, &other);
                StepEffect::Nothing
            }
        }
    }

    fn apply_persistence(&self, step: &mut Step, ctx: &JobContext) -> Result<StepEffect, StepError> {
        match step.kind().clone() {
            StepKind::Truncate => {
                self.persistence.truncate(step.parameters())?;
                let entry = LogEntry::info(
                    step.name(),
                    format!("Table '{}' truncated", step.parameters().table_name),
                );
                step.add_log(entry);
                Ok(StepEffect::Nothing)
            }
            StepKind::Insert => {
                let resolution = self.resolve_mappings(step, &ctx.headers)?;
                let params = step.parameters();
                let table = params.table_name.clone();
                let inserted = self
                    .persistence
                    .insert_data(&ctx.rows, &resolution.mappings, params)? as u64;

                let mut mapping_entry = LogEntry::info(
                    step.name(),
                    format!(
                        "Resolved {} column mappings ({} automatic) for table '{}'",
                        resolution.mappings.len(),
                        resolution.auto_count(),
                        table
                    ),
                );
                if !resolution.unmatched_headers.is_empty() {
                    mapping_entry = mapping_entry
                        .with_context("unmatchedHeaders", resolution.unmatched_headers.join(", "));
                }
                if !resolution.unmapped_columns.is_empty() {
                    mapping_entry = mapping_entry
                        .with_context("unmappedColumns", resolution.unmapped_columns.join(", "));
                }
                step.add_log(mapping_entry);
                step.add_log(LogEntry::info(
                    step.name(),
                    format!("Inserted {} rows into '{}'", inserted, table),
                ));
                Ok(StepEffect::Persisted(inserted))
            }
            StepKind::Select => {
                let params = step.parameters();
                let value = self.persistence.check(params.query.as_deref(), params)?;
                let entry =
                    LogEntry::info(step.name(), "Check query completed").with_context("result", value);
                step.add_log(entry);
                Ok(StepEffect::Nothing)
            }
            other => {
                self.unsupported_step(step, TaskKind::Persistence, &other);
                Ok(StepEffect::Nothing)
            }
        }
    }

    fn resolve_mappings(&self, step: &Step, headers: &[String]) -> Result<MappingResolution, StepError> {
        let params = step.parameters();
        let explicit = params
            .mappings
            .iter()
            .map(ColumnMapping::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if !params.auto_map {
            return Ok(MappingResolution::explicit_only(explicit));
        }

        Ok(self
            .mapper
            .resolve(headers, &params.table_name, params.schema.as_deref(), explicit)?)
    }

    fn unsupported_step(&self, step: &mut Step, task_kind: TaskKind, kind: &StepKind) {
        warn!(step_kind = %kind, task_kind = %task_kind, "Unsupported step kind, skipping");
        let entry = LogEntry::warn(
            step.name(),
            format!("Step kind '{}' is not supported in {} tasks; no-op", kind, task_kind),
        );
        step.add_log(entry);
    }
}

/// Terminal status of a job from the tasks that ran: `SUCCESS` when none
/// failed, `FAILED` when all failed, `PARTIAL` otherwise.
pub fn terminal_status(tasks: &[Task]) -> Status {
    let ran: Vec<&Task> = tasks.iter().filter(|t| t.status() != Status::Pending).collect();
    let failed = ran.iter().filter(|t| t.status() == Status::Failed).count();

    if failed == 0 {
        Status::Success
    } else if failed == ran.len() {
        Status::Failed
    } else {
        Status::Partial
    }
}
