//! Import job orchestration.
//!
//! [`Importer::run`] drives one job per [`TriggerEvent`] through the states
//!
//! ```text
//! Idle -> Validating -> Parsing <-> Committing -> Done
//!                 \________\___________\_______-> Failed
//! ```
//!
//! Records are pulled from the selected parser one at a time. When the accumulator yields a full
//! group the job moves to `Committing` and does not pull another record until the commit has
//! returned.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::blob::{BlobStorage, TriggerEvent};
use crate::config::ImportConfig;
use crate::error::IngestionResult;
use crate::execution::{BatchAccumulator, CommitExecutor, CommitMetrics};
use crate::store::{DocumentStore, MAX_BATCH_SIZE};
use crate::types::{CommitGroup, Record};

use super::csv::CsvRecords;
use super::json::{self, EagerParseError};
use super::json_stream::stream_array;
use super::observability::{BatchStats, IngestionContext, IngestionObserver, IngestionSeverity};
use super::unified::{ImportFormat, object_extension};

/// Orchestrator state of a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Validating,
    Parsing,
    Committing,
    Done,
    Failed,
}

/// Why a job ended without writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The object is not under the configured import folder.
    OutsideImportFolder { folder: String },
    /// The event reports no size, i.e. the object was removed.
    Deleted,
    /// The object's extension is neither `.csv` nor `.json`.
    UnsupportedFormat { extension: Option<String> },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsideImportFolder { folder } => write!(f, "not in import folder '{folder}'"),
            Self::Deleted => write!(f, "object was deleted"),
            Self::UnsupportedFormat { extension: Some(ext) } => {
                write!(f, "unsupported extension '.{ext}', only .json and .csv are supported")
            }
            Self::UnsupportedFormat { extension: None } => {
                write!(f, "no file extension, only .json and .csv are supported")
            }
        }
    }
}

/// Which parser produced the records of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    Csv,
    /// Whole-document JSON parse.
    JsonEager,
    /// Streaming JSON array parse, either as fallback or because the input was too large.
    JsonStreaming,
}

/// Summary of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub parser: ParsePath,
    /// Records written.
    pub records: usize,
    /// Groups committed.
    pub groups: usize,
}

/// Result of a job that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Imported(ImportStats),
    Skipped(SkipReason),
}

/// The immutable description of one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportJob {
    pub bucket: String,
    pub object_name: String,
    pub format: ImportFormat,
    pub target_collection: String,
}

impl ImportJob {
    /// Build the job for `event` under `config`.
    pub fn from_event(event: &TriggerEvent, config: &ImportConfig) -> Self {
        Self {
            bucket: event.bucket.clone(),
            object_name: event.object_name.clone(),
            format: ImportFormat::from_object_name(&event.object_name),
            target_collection: config.target_collection.clone(),
        }
    }

    fn context(&self) -> IngestionContext {
        IngestionContext {
            bucket: self.bucket.clone(),
            object_name: self.object_name.clone(),
            format: self.format,
        }
    }
}

/// Runs import jobs against a blob storage and a document store.
///
/// The importer holds only read-only state and thread-safe handles, so one instance can serve
/// many events concurrently (see [`Importer::run_all`]).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use blob_importer::blob::InMemoryStorage;
/// use blob_importer::config::ImportConfig;
/// use blob_importer::ingestion::{Importer, JobOutcome};
/// use blob_importer::store::InMemoryDocumentStore;
///
/// let blobs = Arc::new(InMemoryStorage::new());
/// let store = Arc::new(InMemoryDocumentStore::new());
/// let event = blobs.put("bucket", "imports/people.csv", "id,name\n1,Ada\n2,Grace\n");
///
/// let importer = Importer::new(ImportConfig::new("people"), blobs, store.clone());
/// let outcome = importer.run(&event)?;
///
/// assert!(matches!(outcome, JobOutcome::Imported(ref s) if s.records == 2));
/// assert_eq!(store.count("people"), 2);
/// # Ok::<(), blob_importer::IngestionError>(())
/// ```
pub struct Importer {
    config: ImportConfig,
    blobs: Arc<dyn BlobStorage>,
    store: Arc<dyn DocumentStore>,
    observer: Option<Arc<dyn IngestionObserver>>,
    alert_at_or_above: IngestionSeverity,
    metrics: Arc<CommitMetrics>,
}

impl fmt::Debug for Importer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Importer")
            .field("config", &self.config)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Importer {
    /// Create an importer.
    pub fn new(
        config: ImportConfig,
        blobs: Arc<dyn BlobStorage>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            blobs,
            store,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
            metrics: Arc::new(CommitMetrics::new()),
        }
    }

    /// Attach an observer for job events.
    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Severity at or above which failures are also reported through `on_alert`.
    pub fn with_alert_threshold(mut self, severity: IngestionSeverity) -> Self {
        self.alert_at_or_above = severity;
        self
    }

    /// Get a handle to real-time job and commit metrics.
    pub fn metrics(&self) -> Arc<CommitMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run the import job for one trigger event.
    ///
    /// Returns `Ok(JobOutcome::Skipped(_))` for out-of-scope events and unsupported formats,
    /// `Ok(JobOutcome::Imported(_))` once every record is committed, and `Err(_)` if parsing or
    /// committing failed. Groups committed before a failure stay committed; re-running the event
    /// starts over and writes them again.
    pub fn run(&self, event: &TriggerEvent) -> IngestionResult<JobOutcome> {
        let job = ImportJob::from_event(event, &self.config);
        let ctx = job.context();
        self.metrics.on_job_started();
        info!(bucket = %job.bucket, object = %job.object_name, "processing file");

        let mut run = JobRun::new(self, &job, &ctx);
        run.transition(JobState::Validating);

        let outcome = match self.validate(event, &job) {
            Err(reason) => Ok(JobOutcome::Skipped(reason)),
            Ok(parser) => {
                run.transition(JobState::Parsing);
                run.dispatch(parser, event.size_bytes)
            }
        };

        match outcome {
            Ok(JobOutcome::Skipped(reason)) => {
                run.transition(JobState::Done);
                self.metrics.on_job_skipped();
                match reason {
                    SkipReason::UnsupportedFormat { .. } => {
                        warn!(object = %job.object_name, reason = %reason, "skipping file");
                    }
                    _ => {
                        info!(object = %job.object_name, reason = %reason, "skipping file");
                    }
                }
                if let Some(obs) = &self.observer {
                    obs.on_skipped(&ctx, &reason);
                }
                Ok(JobOutcome::Skipped(reason))
            }
            Ok(JobOutcome::Imported(stats)) => {
                run.transition(JobState::Done);
                self.metrics.on_job_succeeded();
                info!(
                    object = %job.object_name,
                    collection = %job.target_collection,
                    records = stats.records,
                    groups = stats.groups,
                    parser = ?stats.parser,
                    "imported file"
                );
                if let Some(obs) = &self.observer {
                    obs.on_success(&ctx, &stats);
                }
                Ok(JobOutcome::Imported(stats))
            }
            Err(e) => {
                run.transition(JobState::Failed);
                self.metrics.on_job_failed();
                let severity = IngestionSeverity::for_error(&e);
                error!(
                    object = %job.object_name,
                    committed_records = run.executor.committed_records(),
                    severity = ?severity,
                    error = %e,
                    "import failed"
                );
                if let Some(obs) = &self.observer {
                    obs.on_failure(&ctx, severity, &e);
                    if severity >= self.alert_at_or_above {
                        obs.on_alert(&ctx, severity, &e);
                    }
                }
                Err(e)
            }
        }
    }

    /// Run one independent job per event, in parallel.
    ///
    /// Each job is still sequential internally. Results are returned in event order.
    pub fn run_all(&self, events: &[TriggerEvent]) -> Vec<IngestionResult<JobOutcome>> {
        events.par_iter().map(|event| self.run(event)).collect()
    }

    fn validate(&self, event: &TriggerEvent, job: &ImportJob) -> Result<Parser, SkipReason> {
        if !self.config.in_import_folder(&event.object_name) {
            return Err(SkipReason::OutsideImportFolder {
                folder: self.config.import_folder.clone(),
            });
        }
        if event.size_bytes.unwrap_or(0) == 0 {
            return Err(SkipReason::Deleted);
        }
        match job.format {
            ImportFormat::Csv => Ok(Parser::Csv),
            ImportFormat::Json => Ok(Parser::Json),
            ImportFormat::Unsupported => Err(SkipReason::UnsupportedFormat {
                extension: object_extension(&job.object_name).map(str::to_owned),
            }),
        }
    }

    fn batch_capacity(&self) -> usize {
        self.store.max_batch_size().clamp(1, MAX_BATCH_SIZE)
    }
}

// Parser family of a job that passed validation.
#[derive(Debug, Clone, Copy)]
enum Parser {
    Csv,
    Json,
}

// Per-job mutable state: current orchestrator state, the record buffer and the commit executor.
struct JobRun<'a> {
    importer: &'a Importer,
    job: &'a ImportJob,
    ctx: &'a IngestionContext,
    state: JobState,
    accumulator: BatchAccumulator,
    executor: CommitExecutor<'a>,
}

impl<'a> JobRun<'a> {
    fn new(importer: &'a Importer, job: &'a ImportJob, ctx: &'a IngestionContext) -> Self {
        Self {
            importer,
            job,
            ctx,
            state: JobState::Idle,
            accumulator: BatchAccumulator::new(importer.batch_capacity()),
            executor: CommitExecutor::new(
                importer.store.as_ref(),
                &job.target_collection,
                &importer.metrics,
            ),
        }
    }

    fn transition(&mut self, to: JobState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        if let Some(obs) = &self.importer.observer {
            obs.on_state_change(self.ctx, from, to);
        }
    }

    fn dispatch(&mut self, parser: Parser, size_bytes: Option<u64>) -> IngestionResult<JobOutcome> {
        let parser = match parser {
            Parser::Csv => self.import_csv()?,
            Parser::Json => self.import_json(size_bytes)?,
        };
        Ok(JobOutcome::Imported(ImportStats {
            parser,
            records: self.executor.committed_records(),
            groups: self.executor.committed_groups(),
        }))
    }

    fn import_csv(&mut self) -> IngestionResult<ParsePath> {
        debug!(object = %self.job.object_name, "processing csv file");
        let input = self.open()?;
        let mut records = CsvRecords::new(input)?;
        self.drive(records.by_ref())?;
        debug!(object = %self.job.object_name, rows = records.rows_read(), "read csv rows");
        Ok(ParsePath::Csv)
    }

    fn import_json(&mut self, size_bytes: Option<u64>) -> IngestionResult<ParsePath> {
        debug!(object = %self.job.object_name, "processing json file");
        let limit = self.importer.config.eager_parse_max_bytes;

        if size_bytes.is_none_or(|size| size <= limit) {
            match json::parse_document(self.open()?) {
                Ok(records) => {
                    debug!(shape = ?records.shape(), entries = records.entries(), "parsed json document");
                    self.drive(records)?;
                    return Ok(ParsePath::JsonEager);
                }
                Err(EagerParseError::Io(e)) => return Err(e.into()),
                Err(e) => info!(
                    object = %self.job.object_name,
                    reason = %e,
                    "could not parse as a single json document, trying streaming parser"
                ),
            }
        } else {
            info!(
                object = %self.job.object_name,
                size_bytes = ?size_bytes,
                limit,
                "json file exceeds eager parse limit, using streaming parser"
            );
        }

        // Always a fresh stream; an eager attempt may have consumed the first one.
        let input = self.open()?;
        let elements = stream_array(input, |record| self.push(record))?;
        self.finish()?;
        debug!(object = %self.job.object_name, elements, "streamed json array");
        Ok(ParsePath::JsonStreaming)
    }

    fn open(&self) -> IngestionResult<Box<dyn std::io::Read + Send>> {
        Ok(self
            .importer
            .blobs
            .open(&self.job.bucket, &self.job.object_name)?)
    }

    fn drive<I>(&mut self, records: I) -> IngestionResult<()>
    where
        I: Iterator<Item = IngestionResult<Record>>,
    {
        for record in records {
            self.push(record?)?;
        }
        self.finish()
    }

    // Commits before returning whenever the record completes a group, so the producer is not
    // advanced while a commit is outstanding.
    fn push(&mut self, record: Record) -> IngestionResult<()> {
        match self.accumulator.add(record) {
            Some(group) => self.commit(group),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> IngestionResult<()> {
        match self.accumulator.flush() {
            Some(group) => self.commit(group),
            None => Ok(()),
        }
    }

    fn commit(&mut self, group: CommitGroup) -> IngestionResult<()> {
        self.transition(JobState::Committing);
        let records = group.len();
        self.executor.commit(group)?;
        if let Some(obs) = &self.importer.observer {
            obs.on_batch_committed(
                self.ctx,
                BatchStats {
                    group: self.executor.committed_groups(),
                    records,
                },
            );
        }
        self.transition(JobState::Parsing);
        Ok(())
    }
}
