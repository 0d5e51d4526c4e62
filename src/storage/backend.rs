//! Storage backends.
//!
//! [`FileStorage`] keeps one file per record under a directory. Each file is
//! a 4-byte magic followed by the object's payload, written through a
//! temporary file and renamed into place so a record is never half-written.
//!
//! [`MemoryStorage`] keeps records in memory for volatile deployments and
//! counts loads and stores per key.

use super::{NvError, NvStorage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Magic prefix of every record file.
pub const RECORD_MAGIC: &[u8; 4] = b"CNV1";

/// File extension of record files.
const RECORD_EXTENSION: &str = "nv";

/// Directory-backed record storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a key.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    fn io_error(key: &str, source: std::io::Error) -> NvError {
        NvError::Io {
            key: key.to_string(),
            source,
        }
    }
}

impl NvStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Vec<u8>, NvError> {
        let path = self.record_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(NvError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(Self::io_error(key, e)),
        };

        match bytes.strip_prefix(RECORD_MAGIC.as_slice()) {
            Some(payload) => Ok(payload.to_vec()),
            None => Err(NvError::corrupt(key, "bad record magic")),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), NvError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(key, e))?;

        let path = self.record_path(key);
        let tmp = path.with_extension(format!("{}.tmp", RECORD_EXTENSION));
        let write = || -> std::io::Result<()> {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(RECORD_MAGIC)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            std::fs::rename(&tmp, &path)
        };
        write().map_err(|e| Self::io_error(key, e))?;

        tracing::trace!(key, path = %path.display(), len = bytes.len(), "NV record written");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: HashMap<String, Vec<u8>>,
    loads: HashMap<String, usize>,
    stores: HashMap<String, usize>,
}

/// In-memory record storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record.
    pub fn with_record(self, key: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.inner.lock().records.insert(key.into(), bytes);
        self
    }

    /// Current record for a key.
    pub fn record(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().records.get(key).cloned()
    }

    /// Number of load attempts for a key.
    pub fn load_count(&self, key: &str) -> usize {
        self.inner.lock().loads.get(key).copied().unwrap_or(0)
    }

    /// Number of stores for a key.
    pub fn store_count(&self, key: &str) -> usize {
        self.inner.lock().stores.get(key).copied().unwrap_or(0)
    }
}

impl NvStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Vec<u8>, NvError> {
        let mut inner = self.inner.lock();
        *inner.loads.entry(key.to_string()).or_default() += 1;
        inner.records.get(key).cloned().ok_or_else(|| NvError::NotFound {
            key: key.to_string(),
        })
    }

    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), NvError> {
        let mut inner = self.inner.lock();
        *inner.stores.entry(key.to_string()).or_default() += 1;
        inner.records.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
