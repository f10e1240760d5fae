//! The key-value storage seam and its two backends.

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::StorageError;

/// A persistent string-to-string map, the moral equivalent of a
/// browser's `localStorage`.
///
/// # Atomicity
///
/// Each call must be atomic for its single key. Nothing stronger is
/// promised: two keys written back to back can be observed half-updated
/// by a concurrent reader.
pub trait Storage: Send + Sync + 'static {
    /// Returns the value for `key`, or `Ok(None)` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Inserts or overwrites `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is `Ok(())`.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// Degrading helpers shared by the token and metadata stores
// ---------------------------------------------------------------------------

pub(crate) fn read_or_none(storage: Option<&dyn Storage>, key: &str) -> Option<String> {
    let storage = storage?;
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed, treating as absent");
            None
        }
    }
}

pub(crate) fn write_or_skip(storage: Option<&dyn Storage>, key: &str, value: &str) {
    let Some(storage) = storage else { return };
    if let Err(e) = storage.set(key, value) {
        tracing::warn!(key, error = %e, "storage write failed, skipping");
    }
}

pub(crate) fn remove_or_skip(storage: Option<&dyn Storage>, key: &str) {
    let Some(storage) = storage else { return };
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "storage remove failed, skipping");
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage. Clones share the same map, so a test can hand one
/// clone to the client and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage persisted as one JSON object in a file.
///
/// The whole file is re-read on every call and rewritten on every write
/// (write to a sibling temp file, then rename), so a second process
/// sharing the file sees updates and never reads a torn file. The
/// in-process mutex only serializes this process's read-modify-write
/// cycles.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    /// Opens (lazily) the file at `path`. Nothing is created until the
    /// first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = owner_only_file(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(entries)?)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _held = self
            .guard
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".into()))?;
        let mut entries = self.load()?;
        if change(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Creates (or truncates) `path` readable by its owner only. The file
/// holds bearer and refresh tokens.
fn owner_only_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let file = options.open(path)?;
        // `mode` only applies on creation; a stale temp file keeps its own.
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }
    #[cfg(not(unix))]
    {
        options.open(path)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        // Skip the rewrite when there is nothing to remove; this also keeps
        // a never-written file from being created by a logout.
        self.modify(|entries| entries.remove(key).is_some())
    }
}

// =========================================================================
// Tests
// =========================================================================
