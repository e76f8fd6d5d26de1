use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::types::Fields;

use super::{CommitReceipt, DocumentStore, MAX_BATCH_SIZE, StoreError, WriteBatch};

/// Thread-safe in-memory document store.
///
/// Supports commit-failure injection so callers can exercise partial-import and retry behavior.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
    max_batch_size: usize,
}

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<String, BTreeMap<String, Fields>>,
    attempts: usize,
    failing_attempts: BTreeSet<usize>,
    committed_sizes: Vec<usize>,
}

impl InMemoryDocumentStore {
    /// Create an empty store with the default batch limit.
    pub fn new() -> Self {
        Self::with_max_batch_size(MAX_BATCH_SIZE)
    }

    /// Create an empty store accepting at most `max_batch_size` operations per batch.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_batch_size,
        }
    }

    /// Make the `attempt`-th commit call (1-based, counted over the store's lifetime) fail.
    pub fn fail_commit_attempt(&self, attempt: usize) {
        self.lock().failing_attempts.insert(attempt);
    }

    /// Number of commit calls seen so far, successful or not.
    pub fn commit_attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Sizes of successfully committed batches, in commit order.
    pub fn committed_batch_sizes(&self) -> Vec<usize> {
        self.lock().committed_sizes.clone()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, BTreeMap::len)
    }

    /// Returns the document at `id`, if present.
    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// All documents of `collection`, ordered by id.
    pub fn documents(&self, collection: &str) -> Vec<(String, Fields)> {
        self.lock()
            .collections
            .get(collection)
            .map(|docs| docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn commit(&self, collection: &str, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        let mut inner = self.lock();
        inner.attempts += 1;
        let attempt = inner.attempts;

        if inner.failing_attempts.remove(&attempt) {
            return Err(StoreError::new(format!(
                "injected failure on commit attempt {attempt}"
            )));
        }
        if batch.len() > self.max_batch_size {
            return Err(StoreError::new(format!(
                "batch of {} operations exceeds limit {}",
                batch.len(),
                self.max_batch_size
            )));
        }

        let size = batch.len();
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let mut ids = Vec::with_capacity(size);
        for op in batch.into_operations() {
            let id = op.id.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
            docs.insert(id.clone(), op.data);
            ids.push(id);
        }
        inner.committed_sizes.push(size);

        Ok(CommitReceipt { ids })
    }
}
