//! Batched commit engine.
//!
//! This module sits between the parsers in [`crate::ingestion`] and the
//! [`crate::store::DocumentStore`]:
//!
//! - [`BatchAccumulator`] cuts an unbounded record sequence into bounded [`CommitGroup`]s
//! - [`CommitExecutor`] writes one group as one atomic store batch
//! - [`CommitMetrics`] tracks jobs, groups and records for monitoring
//!
//! Groups are committed one at a time. The caller pulls the next record only after the previous
//! commit returned, so at most one group is ever in flight for a job.

mod batch;
mod metrics;

use tracing::{debug, warn};

use crate::error::{IngestionError, IngestionResult};
use crate::store::{CommitReceipt, DocumentStore, WriteBatch};
use crate::types::CommitGroup;

pub use batch::BatchAccumulator;
pub use metrics::{CommitMetrics, CommitMetricsSnapshot};

/// Writes [`CommitGroup`]s to one collection of a [`DocumentStore`].
///
/// A failed commit is returned as [`IngestionError::Commit`] and never retried here.
pub struct CommitExecutor<'a> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    metrics: &'a CommitMetrics,
    groups: usize,
    records: usize,
}

impl<'a> CommitExecutor<'a> {
    /// Create an executor writing to `collection`.
    pub fn new(store: &'a dyn DocumentStore, collection: &'a str, metrics: &'a CommitMetrics) -> Self {
        Self {
            store,
            collection,
            metrics,
            groups: 0,
            records: 0,
        }
    }

    /// Commit `group` as a single atomic batch.
    pub fn commit(&mut self, group: CommitGroup) -> IngestionResult<CommitReceipt> {
        let group_no = self.groups + 1;
        let records = group.len();

        let mut batch = WriteBatch::with_limit(self.store.max_batch_size());
        for record in group.into_records() {
            batch
                .set(record.id, record.fields)
                .map_err(|source| IngestionError::Commit {
                    group: group_no,
                    records,
                    source,
                })?;
        }

        match self.store.commit(self.collection, batch) {
            Ok(receipt) => {
                self.groups = group_no;
                self.records += records;
                self.metrics.on_group_committed(records);
                debug!(
                    collection = self.collection,
                    group = group_no,
                    records,
                    "committed batch"
                );
                Ok(receipt)
            }
            Err(source) => {
                self.metrics.on_commit_failed();
                warn!(
                    collection = self.collection,
                    group = group_no,
                    records,
                    error = %source,
                    "batch commit failed"
                );
                Err(IngestionError::Commit {
                    group: group_no,
                    records,
                    source,
                })
            }
        }
    }

    /// Groups committed so far.
    pub fn committed_groups(&self) -> usize {
        self.groups
    }

    /// Records committed so far.
    pub fn committed_records(&self) -> usize {
        self.records
    }
}
