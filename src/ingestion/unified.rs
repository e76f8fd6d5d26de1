//! Format routing.
//!
//! The importer picks a parser from the object name's extension. The set of formats is closed:
//! anything that is not CSV or JSON is [`ImportFormat::Unsupported`] and is skipped without
//! writing.

use std::path::Path;

/// Input format of an import job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array or object.
    Json,
    /// Any other extension, or none.
    Unsupported,
}

impl ImportFormat {
    /// Classify a file extension (without the dot, case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "json" => Self::Json,
            _ => Self::Unsupported,
        }
    }

    /// Classify an object name such as `imports/people.CSV`.
    pub fn from_object_name(name: &str) -> Self {
        object_extension(name).map_or(Self::Unsupported, Self::from_extension)
    }
}

/// Extension of the last path segment of `name`, if any. Dotfiles have no extension.
pub fn object_extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|s| s.to_str())
}
