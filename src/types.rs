//! Core data model types for importing.
//!
//! Parsers produce [`Record`]s, the batch accumulator groups them into [`CommitGroup`]s and the
//! commit executor writes each group to the document store as one atomic batch.

use serde_json::{Map, Value};

/// Document body: field name to scalar-or-nested JSON value.
pub type Fields = Map<String, Value>;

/// A single document produced by a parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Explicit document id. `None` lets the store assign one at commit time.
    pub id: Option<String>,
    /// Document content.
    pub fields: Fields,
}

impl Record {
    /// Create a record whose id is assigned by the store.
    pub fn new(fields: Fields) -> Self {
        Self { id: None, fields }
    }

    /// Create a record written to an explicit document id.
    pub fn with_id(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: Some(id.into()),
            fields,
        }
    }

    /// Number of top-level fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the value of a top-level field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// An ordered, bounded set of records committed as one atomic write.
///
/// Groups are only built by [`crate::execution::BatchAccumulator`], which guarantees
/// `1 <= len <= capacity`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitGroup {
    records: Vec<Record>,
}

impl CommitGroup {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        debug_assert!(!records.is_empty(), "commit groups are never empty");
        Self { records }
    }

    /// Number of records in the group.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false` for groups yielded by the accumulator.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the group, returning its records in commit order.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
