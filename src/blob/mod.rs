//! Blob storage: the source side of an import.
//!
//! A [`TriggerEvent`] announces that an object was written to a bucket. The importer opens the
//! object through [`BlobStorage`]; the JSON path may open the same object twice (eager attempt,
//! then streaming fallback), so implementations must hand out a fresh stream positioned at the
//! start on every call.

mod local;
mod memory;

use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};

pub use local::LocalStorage;
pub use memory::InMemoryStorage;

/// Storage notification that starts an import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Object path inside the bucket, e.g. `imports/people.csv`.
    #[serde(rename = "name")]
    pub object_name: String,
    /// Bucket holding the object.
    pub bucket: String,
    /// Object size in bytes. Absent or zero for deletions.
    #[serde(rename = "size", default, deserialize_with = "size_from_number_or_string")]
    pub size_bytes: Option<u64>,
}

impl TriggerEvent {
    /// Create an event for an object of known size.
    pub fn new(bucket: impl Into<String>, object_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            object_name: object_name.into(),
            bucket: bucket.into(),
            size_bytes: Some(size_bytes),
        }
    }
}

// Storage notifications encode the size as a decimal string.
fn size_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }

    match Option::<Size>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Size::Number(n)) => Ok(Some(n)),
        Some(Size::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Read access to objects in buckets.
pub trait BlobStorage: Send + Sync {
    /// Open `object` in `bucket` for reading from its first byte.
    fn open(&self, bucket: &str, object: &str) -> std::io::Result<Box<dyn Read + Send>>;
}
