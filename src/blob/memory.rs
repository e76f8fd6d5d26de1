use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, Mutex, PoisonError};

use super::{BlobStorage, TriggerEvent};

/// In-memory blob storage keyed by `(bucket, object)`.
///
/// Counts how often each object was opened, which lets callers observe the eager/streaming
/// re-open behavior of the JSON path.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    objects: Mutex<HashMap<(String, String), Entry>>,
}

#[derive(Debug)]
struct Entry {
    bytes: Arc<[u8]>,
    opens: usize,
}

impl InMemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `bucket`/`object` and return the matching trigger event.
    pub fn put(&self, bucket: &str, object: &str, bytes: impl Into<Vec<u8>>) -> TriggerEvent {
        let bytes: Vec<u8> = bytes.into();
        let size = bytes.len() as u64;
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (bucket.to_string(), object.to_string()),
                Entry {
                    bytes: bytes.into(),
                    opens: 0,
                },
            );
        TriggerEvent::new(bucket, object, size)
    }

    /// Number of times `bucket`/`object` has been opened.
    pub fn open_count(&self, bucket: &str, object: &str) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), object.to_string()))
            .map_or(0, |e| e.opens)
    }
}

impl BlobStorage for InMemoryStorage {
    fn open(&self, bucket: &str, object: &str) -> io::Result<Box<dyn Read + Send>> {
        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = objects
            .get_mut(&(bucket.to_string(), object.to_string()))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such object: {bucket}/{object}"),
                )
            })?;
        entry.opens += 1;
        Ok(Box::new(Cursor::new(Arc::clone(&entry.bytes))))
    }
}
