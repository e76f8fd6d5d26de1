use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Real-time counters for import jobs and their commits.
///
/// The importer updates these while jobs run; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct CommitMetrics {
    jobs_started: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_skipped: AtomicU64,
    jobs_failed: AtomicU64,

    groups_committed: AtomicU64,
    records_written: AtomicU64,
    commit_failures: AtomicU64,
    largest_group: AtomicUsize,
}

impl CommitMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_job_started(&self) {
        let _ = self.jobs_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_job_succeeded(&self) {
        let _ = self.jobs_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_job_skipped(&self) {
        let _ = self.jobs_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_job_failed(&self) {
        let _ = self.jobs_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_group_committed(&self, records: usize) {
        let _ = self.groups_committed.fetch_add(1, Ordering::SeqCst);
        let _ = self.records_written.fetch_add(records as u64, Ordering::SeqCst);
        let _ = self.largest_group.fetch_max(records, Ordering::SeqCst);
    }

    pub fn on_commit_failed(&self) {
        let _ = self.commit_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> CommitMetricsSnapshot {
        CommitMetricsSnapshot {
            jobs_started: self.jobs_started.load(Ordering::SeqCst),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::SeqCst),
            jobs_skipped: self.jobs_skipped.load(Ordering::SeqCst),
            jobs_failed: self.jobs_failed.load(Ordering::SeqCst),
            groups_committed: self.groups_committed.load(Ordering::SeqCst),
            records_written: self.records_written.load(Ordering::SeqCst),
            commit_failures: self.commit_failures.load(Ordering::SeqCst),
            largest_group: self.largest_group.load(Ordering::SeqCst),
        }
    }
}

/// Immutable snapshot of [`CommitMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommitMetricsSnapshot {
    pub jobs_started: u64,
    pub jobs_succeeded: u64,
    pub jobs_skipped: u64,
    pub jobs_failed: u64,
    pub groups_committed: u64,
    pub records_written: u64,
    pub commit_failures: u64,
    pub largest_group: usize,
}

impl fmt::Display for CommitMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "jobs={} (ok={}, skipped={}, failed={}), groups={}, records={}, commit_failures={}, largest_group={}",
            self.jobs_started,
            self.jobs_succeeded,
            self.jobs_skipped,
            self.jobs_failed,
            self.groups_committed,
            self.records_written,
            self.commit_failures,
            self.largest_group
        )
    }
}
