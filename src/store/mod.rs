//! Document-store write interface.
//!
//! The importer only needs one capability from the store: submit a [`WriteBatch`] of
//! set-operations atomically. Backends implement [`DocumentStore`]; an in-memory implementation
//! ([`InMemoryDocumentStore`]) is provided for tests and local runs.

mod memory;

use std::error::Error as StdError;

use thiserror::Error;

use crate::types::Fields;

pub use memory::InMemoryDocumentStore;

/// Per-batch operation limit of the document store.
pub const MAX_BATCH_SIZE: usize = 500;

/// One "set" write: either a new document with a store-assigned id, or a full overwrite of the
/// document at `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    /// Target document id, or `None` for a generated id.
    pub id: Option<String>,
    /// Document content.
    pub data: Fields,
}

/// A bounded list of set-operations committed as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    ops: Vec<SetOperation>,
    limit: usize,
}

impl WriteBatch {
    /// Create an empty batch accepting at most [`MAX_BATCH_SIZE`] operations.
    pub fn new() -> Self {
        Self::with_limit(MAX_BATCH_SIZE)
    }

    /// Create an empty batch accepting at most `limit` operations.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ops: Vec::with_capacity(limit.min(MAX_BATCH_SIZE)),
            limit,
        }
    }

    /// Queue a set-operation. Fails once the batch holds `limit` operations.
    pub fn set(&mut self, id: Option<String>, data: Fields) -> Result<(), StoreError> {
        if self.ops.len() >= self.limit {
            return Err(StoreError::new(format!(
                "write batch is full ({} operations)",
                self.limit
            )));
        }
        self.ops.push(SetOperation { id, data });
        Ok(())
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if no operation has been queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Borrow the queued operations in order.
    pub fn operations(&self) -> &[SetOperation] {
        &self.ops
    }

    /// Consume the batch, returning its operations in order.
    pub fn into_operations(self) -> Vec<SetOperation> {
        self.ops
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a successful batch commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Ids of the written documents, in batch order (generated ids included).
    pub ids: Vec<String>,
}

/// A batch commit was rejected. The whole batch is considered unwritten.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StoreError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping a backend error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Batched-write sink.
///
/// Implementations must apply a batch atomically: either every operation is visible after
/// `commit` returns `Ok`, or none is.
pub trait DocumentStore: Send + Sync {
    /// Maximum number of operations accepted in one batch.
    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }

    /// Atomically apply every operation of `batch` to `collection`.
    fn commit(&self, collection: &str, batch: WriteBatch) -> Result<CommitReceipt, StoreError>;
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::{StoreError, WriteBatch};

    #[test]
    fn write_batch_rejects_operations_past_limit() {
        let mut batch = WriteBatch::with_limit(2);
        batch.set(None, Map::new()).unwrap();
        batch.set(Some("a".to_string()), Map::new()).unwrap();

        let err = batch.set(None, Map::new()).unwrap_err();
        assert!(err.message().contains("full"));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.operations()[1].id.as_deref(), Some("a"));
    }

    #[test]
    fn store_error_exposes_source() {
        let io = std::io::Error::other("connection reset");
        let err = StoreError::with_source("commit failed", io);
        assert_eq!(err.to_string(), "commit failed");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }
}
