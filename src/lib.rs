//! `blob-importer` turns files dropped into a storage bucket into documents in a document store.
//!
//! The primary entrypoint is [`ingestion::Importer::run`], which takes a storage
//! [`blob::TriggerEvent`], picks a parser from the object's extension and writes the parsed
//! records in bounded atomic batches.
//!
//! ## What gets imported
//!
//! Only objects under the configured import folder (`imports/` by default) are considered.
//!
//! - **CSV** (`.csv`): one document per row. Cells are typed: empty → `null`, `true`/`false` →
//!   boolean, numbers → integer or float, everything else → trimmed string. Columns with a blank
//!   header are dropped.
//! - **JSON** (`.json`):
//!   - an array → one document per element;
//!   - an object → nested objects are written to the document id named by their key, other
//!     values become a single-field document; `{}` yields one empty document.
//!
//!   If the file is not a single well-formed JSON value (or is larger than
//!   [`config::ImportConfig::eager_parse_max_bytes`]) it is re-read with a streaming parser that
//!   expects a top-level array and holds only one element in memory at a time.
//!
//! Any other extension is skipped with a warning and no writes.
//!
//! ## Batching and failures
//!
//! Records are committed in groups of at most [`store::MAX_BATCH_SIZE`] (500), one group at a
//! time. A failed commit fails the whole job; earlier groups stay written. Jobs are not
//! idempotent: re-running a failed job writes every generated-id record again.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use blob_importer::blob::InMemoryStorage;
//! use blob_importer::config::ImportConfig;
//! use blob_importer::ingestion::{Importer, JobOutcome, SkipReason};
//! use blob_importer::store::InMemoryDocumentStore;
//!
//! let blobs = Arc::new(InMemoryStorage::new());
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let importer = Importer::new(ImportConfig::new("users"), blobs.clone(), store.clone());
//!
//! let json = blobs.put("uploads", "imports/users.json", r#"{"ada": {"age": 36}, "count": 1}"#);
//! importer.run(&json).unwrap();
//! assert_eq!(store.count("users"), 2);
//! assert!(store.document("users", "ada").is_some());
//!
//! let other = blobs.put("uploads", "imports/users.xml", "<users/>");
//! let outcome = importer.run(&other).unwrap();
//! assert!(matches!(outcome, JobOutcome::Skipped(SkipReason::UnsupportedFormat { .. })));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: format routing, parsers and the job orchestrator
//! - [`execution`]: batch accumulation, commit execution and metrics
//! - [`blob`]: trigger events and blob storage backends
//! - [`store`]: document store interface and in-memory backend
//! - [`config`]: environment-based configuration
//! - [`types`]: records and commit groups
//! - [`error`]: error types used across the crate
//!
//! Logging goes through [`tracing`]; install a subscriber in the host process to see it.

pub mod blob;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod store;
pub mod types;

pub use error::{IngestionError, IngestionResult};
