use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Minimal get/set persistence seam for the caches.
///
/// Implementations swallow their own failures: a read error looks like a
/// miss, a write error is logged and dropped. The caches must keep working
/// in-memory either way.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// One file per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create storage dir; state not persisted");
            return;
        }
        // Write-then-rename: a crash mid-write leaves the previous blob
        // intact instead of a truncated one the next load would discard.
        let path = self.path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        if let Err(e) = fs::write(&tmp, value) {
            warn!(key, error = %e, "cache write failed; state not persisted");
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            warn!(key, error = %e, "cache rename failed; state not persisted");
        }
    }
}

/// In-memory storage. Used by tests, and as the fallback when no storage
/// directory is usable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }
}
