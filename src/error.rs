use thiserror::Error;

use crate::store::StoreError;

/// Convenience result type for import operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by import jobs.
///
/// A single error enum shared across the CSV and JSON paths, the commit engine and configuration.
/// Anything returned as an `IngestionError` fails the job; out-of-scope triggers and unsupported
/// formats are reported as [`crate::ingestion::JobOutcome::Skipped`] instead.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error while opening or reading a blob.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The streaming JSON parser hit malformed input.
    #[error("malformed json: {message}")]
    StreamingParse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A parsed value cannot be stored as a document body.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// A write batch was rejected by the document store.
    #[error("commit of group {group} ({records} records) failed: {source}")]
    Commit {
        group: usize,
        records: usize,
        #[source]
        source: StoreError,
    },

    /// Missing or invalid configuration.
    #[error("config error: {message}")]
    Config { message: String },
}
