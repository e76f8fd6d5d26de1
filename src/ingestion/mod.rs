//! Import pipeline: format routing, parsers and the job orchestrator.
//!
//! Most callers should use [`Importer::run`] (from [`orchestrator`]) which:
//!
//! - skips events outside the import folder, deletions and unsupported formats
//! - routes `.csv` / `.json` objects to the matching parser
//! - commits records in bounded atomic groups
//! - optionally reports job events to an [`IngestionObserver`]
//!
//! Parsers are also available on their own:
//! - [`csv`]: streaming CSV rows with scalar coercion ([`coerce`])
//! - [`json`]: eager whole-document JSON parsing
//! - [`json_stream`]: streaming parse of a top-level JSON array

pub mod coerce;
pub mod csv;
pub mod json;
pub mod json_stream;
pub mod observability;
pub mod orchestrator;
pub mod unified;

pub use observability::{
    BatchStats, CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity,
};
pub use orchestrator::{
    ImportJob, ImportStats, Importer, JobOutcome, JobState, ParsePath, SkipReason,
};
pub use unified::ImportFormat;
