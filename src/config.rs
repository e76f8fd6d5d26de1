//! Import configuration.
//!
//! Configuration is read once at process start and passed to the importer as an immutable value.
//!
//! | Variable                | Default    | Meaning                                              |
//! |-------------------------|------------|------------------------------------------------------|
//! | `IMPORT_FOLDER`         | `imports`  | Only objects under `<folder>/` are imported          |
//! | `TARGET_COLLECTION`     | (required) | Collection receiving the documents                   |
//! | `EAGER_PARSE_MAX_BYTES` | 32 MiB     | JSON files above this size skip the eager parse      |

use std::env;

use crate::error::{IngestionError, IngestionResult};

/// Default import folder.
pub const DEFAULT_IMPORT_FOLDER: &str = "imports";

/// Default size above which JSON inputs go straight to the streaming parser.
pub const DEFAULT_EAGER_PARSE_MAX_BYTES: u64 = 32 * 1024 * 1024;

/// Read-only settings shared by every import job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Path prefix (without trailing `/`) an object must live under to be imported.
    pub import_folder: String,
    /// Destination collection.
    pub target_collection: String,
    /// JSON inputs whose reported size exceeds this are parsed with the streaming parser only.
    pub eager_parse_max_bytes: u64,
}

impl ImportConfig {
    /// Create a config for `target_collection` with default settings.
    pub fn new(target_collection: impl Into<String>) -> Self {
        Self {
            import_folder: DEFAULT_IMPORT_FOLDER.to_string(),
            target_collection: target_collection.into(),
            eager_parse_max_bytes: DEFAULT_EAGER_PARSE_MAX_BYTES,
        }
    }

    /// Override the import folder. Leading and trailing `/` are stripped.
    pub fn with_import_folder(mut self, folder: impl AsRef<str>) -> Self {
        self.import_folder = folder.as_ref().trim_matches('/').to_string();
        self
    }

    /// Override the eager-parse size limit.
    pub fn with_eager_parse_max_bytes(mut self, limit: u64) -> Self {
        self.eager_parse_max_bytes = limit;
        self
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> IngestionResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> IngestionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target_collection = lookup("TARGET_COLLECTION")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| IngestionError::Config {
                message: "TARGET_COLLECTION must be set".to_string(),
            })?;

        let mut config = Self::new(target_collection);

        if let Some(folder) = lookup("IMPORT_FOLDER").filter(|v| !v.trim().is_empty()) {
            config = config.with_import_folder(folder.trim());
        }

        if let Some(raw) = lookup("EAGER_PARSE_MAX_BYTES") {
            let limit = raw.trim().parse::<u64>().map_err(|e| IngestionError::Config {
                message: format!("EAGER_PARSE_MAX_BYTES must be a byte count (got '{raw}'): {e}"),
            })?;
            config = config.with_eager_parse_max_bytes(limit);
        }

        Ok(config)
    }

    /// Returns `true` if `object_name` lives under the import folder.
    pub fn in_import_folder(&self, object_name: &str) -> bool {
        object_name
            .strip_prefix(self.import_folder.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }
}
