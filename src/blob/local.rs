use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::{BlobStorage, TriggerEvent};

/// Directory-backed blob storage: bucket `b` is the directory `<root>/b`, and object names are
/// `/`-separated paths inside it.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a storage rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// List every file in `bucket` below `prefix/` as a trigger event, ordered by object name.
    ///
    /// Used to replay a watched folder when no notification channel is available.
    pub fn scan(&self, bucket: &str, prefix: &str) -> io::Result<Vec<TriggerEvent>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let start = bucket_dir.join(checked_relative(prefix)?);
        if !start.exists() {
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for entry in WalkDir::new(&start).follow_links(false) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&bucket_dir)
                .map_err(io::Error::other)?;
            let object_name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry.metadata().map_err(io::Error::other)?.len();
            events.push(TriggerEvent::new(bucket, object_name, size));
        }
        events.sort_by(|a, b| a.object_name.cmp(&b.object_name));
        Ok(events)
    }

    fn bucket_dir(&self, bucket: &str) -> io::Result<PathBuf> {
        Ok(self.root.join(checked_relative(bucket)?))
    }
}

impl BlobStorage for LocalStorage {
    fn open(&self, bucket: &str, object: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.bucket_dir(bucket)?.join(checked_relative(object)?);
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

// Object names must stay inside their bucket.
fn checked_relative(name: &str) -> io::Result<&Path> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("object name escapes its bucket: {name}"),
        ));
    }
    Ok(path)
}
