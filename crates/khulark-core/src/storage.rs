//! Durable key-value storage for the save document.
//!
//! The game persists one JSON document under one key. [`SaveStorage`] is
//! the seam: [`FileStorage`] writes it to disk, [`MemoryStorage`] keeps it
//! in memory with an optional quota for exercising write failures.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// A single-key document store.
pub trait SaveStorage: Send + Sync {
    /// Read the stored document, or `None` if nothing has been saved.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Replace the stored document.
    fn write(&self, contents: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// Stores the document as `<dir>/<key>.json`.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create storage for `key` inside `dir`. The directory is created on
    /// first write.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    /// Location of the save file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// Keeps the document in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Empty storage with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty storage that rejects documents larger than `limit` bytes.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            quota: Some(limit),
        }
    }

    /// Storage pre-seeded with `contents`.
    pub fn seeded(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
            quota: None,
        }
    }

    /// The currently stored document.
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SaveStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StoreError> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(slot.clone())
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota
            && contents.len() > limit
        {
            return Err(StoreError::QuotaExceeded {
                attempted: contents.len(),
                limit,
            });
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *slot = Some(contents.to_owned());
        Ok(())
    }
}
