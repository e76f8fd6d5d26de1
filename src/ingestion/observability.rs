use std::fmt;
use std::sync::Arc;

use crate::error::IngestionError;

use super::orchestrator::{ImportStats, JobState, SkipReason};
use super::unified::ImportFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Error-level event (job failed on its input).
    Error,
    /// Critical error (I/O, store or configuration failures).
    Critical,
}

impl IngestionSeverity {
    /// Classify a job failure.
    pub fn for_error(e: &IngestionError) -> Self {
        match e {
            IngestionError::Io(_) => Self::Critical,
            IngestionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => Self::Critical,
                _ => Self::Error,
            },
            IngestionError::StreamingParse { .. } => Self::Error,
            IngestionError::InvalidDocument { .. } => Self::Error,
            IngestionError::Commit { .. } => Self::Critical,
            IngestionError::Config { .. } => Self::Critical,
        }
    }
}

/// Identifies the object an import job is working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    /// Source bucket.
    pub bucket: String,
    /// Source object name.
    pub object_name: String,
    /// Format chosen by the router.
    pub format: ImportFormat,
}

/// Reported after each committed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// 1-based group number within the job.
    pub group: usize,
    /// Records in the group.
    pub records: usize,
}

/// Observer interface for import jobs.
///
/// Implementors can record metrics, logs, or trigger alerts. Every method has a no-op default.
pub trait IngestionObserver: Send + Sync {
    /// Called on every orchestrator state transition.
    fn on_state_change(&self, _ctx: &IngestionContext, _from: JobState, _to: JobState) {}

    /// Called when a job ends without writing because its trigger is out of scope.
    fn on_skipped(&self, _ctx: &IngestionContext, _reason: &SkipReason) {}

    /// Called after each successfully committed group.
    fn on_batch_committed(&self, _ctx: &IngestionContext, _stats: BatchStats) {}

    /// Called when a job commits every record it produced.
    fn on_success(&self, _ctx: &IngestionContext, _stats: &ImportStats) {}

    /// Called when a job fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a failure meets the importer's alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_state_change(&self, ctx: &IngestionContext, from: JobState, to: JobState) {
        for o in &self.observers {
            o.on_state_change(ctx, from, to);
        }
    }

    fn on_skipped(&self, ctx: &IngestionContext, reason: &SkipReason) {
        for o in &self.observers {
            o.on_skipped(ctx, reason);
        }
    }

    fn on_batch_committed(&self, ctx: &IngestionContext, stats: BatchStats) {
        for o in &self.observers {
            o.on_batch_committed(ctx, stats);
        }
    }

    fn on_success(&self, ctx: &IngestionContext, stats: &ImportStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}
