//! Content-hash cache backing incremental re-indexing.

use crate::error::CacheError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub struct FileHashCache {
    store_path: PathBuf,
    hashes: Mutex<HashMap<String, String>>,
}

impl FileHashCache {
    pub fn load(cache_dir: &Path) -> Result<Self, CacheError> {
        let store_path = cache_dir.join("file_hashes.json");
        let hashes = if store_path.exists() {
            let content = fs::read_to_string(&store_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            store_path,
            hashes: Mutex::new(hashes),
        })
    }

    /// True when `path`'s current content hash differs from what is stored,
    /// or no prior entry exists.
    pub fn has_changed(&self, path: &Path) -> Result<bool, CacheError> {
        let current = self.hash_of(path)?;
        let key = path.to_string_lossy().to_string();
        let stored = self.hashes.lock().unwrap().get(&key).cloned();
        Ok(stored.as_deref() != Some(current.as_str()))
    }

    pub fn update(&self, path: &Path) -> Result<String, CacheError> {
        let current = self.hash_of(path)?;
        let key = path.to_string_lossy().to_string();
        self.hashes.lock().unwrap().insert(key, current.clone());
        self.persist()?;
        Ok(current)
    }

    fn hash_of(&self, path: &Path) -> Result<String, CacheError> {
        let bytes = fs::read(path)?;
        Ok(hash_bytes(&bytes))
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let guard = self.hashes.lock().unwrap();
        let json = serde_json::to_string_pretty(&*guard)?;
        let tmp_path = self.store_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.store_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_unchanged_content_after_update() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let file_path = dir.path().join("a.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        let cache = FileHashCache::load(&cache_dir).unwrap();
        assert!(cache.has_changed(&file_path).unwrap());
        cache.update(&file_path).unwrap();
        assert!(!cache.has_changed(&file_path).unwrap());

        fs::write(&file_path, "x = 2\n").unwrap();
        assert!(cache.has_changed(&file_path).unwrap());
    }

    #[test]
    fn reloads_persisted_hashes_from_disk() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let file_path = dir.path().join("a.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        {
            let cache = FileHashCache::load(&cache_dir).unwrap();
            cache.update(&file_path).unwrap();
        }

        let reloaded = FileHashCache::load(&cache_dir).unwrap();
        assert!(!reloaded.has_changed(&file_path).unwrap());
    }
}
