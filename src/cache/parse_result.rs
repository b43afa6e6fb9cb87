//! Per-file parse payload cache with TTL and content-hash invalidation.

use crate::cache::file_hash::FileHashCache;
use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResultMetadata {
    pub cached_at: DateTime<Utc>,
    pub language: String,
    pub result_size: usize,
    pub structure_signature: Option<String>,
}

pub struct ParseResultCache {
    payload_dir: PathBuf,
    metadata_path: PathBuf,
    metadata: Mutex<HashMap<String, ParseResultMetadata>>,
    ttl: Option<Duration>,
}

fn safe_name(path: &Path) -> String {
    let hashed = crate::cache::file_hash::hash_bytes(path.to_string_lossy().as_bytes());
    format!("{}.json", &hashed[..32])
}

impl ParseResultCache {
    pub fn load(cache_dir: &Path, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let payload_dir = cache_dir.join("parse_results");
        let metadata_path = payload_dir.join("metadata.json");
        fs::create_dir_all(&payload_dir)?;
        let metadata = if metadata_path.exists() {
            let content = fs::read_to_string(&metadata_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            payload_dir,
            metadata_path,
            metadata: Mutex::new(metadata),
            ttl,
        })
    }

    /// Returns the cached payload when the file's hash is unchanged, the entry
    /// has not exceeded its TTL, and the payload file still exists and parses.
    pub fn get(
        &self,
        path: &Path,
        hash_cache: &FileHashCache,
    ) -> Result<Option<serde_json::Value>, CacheError> {
        if hash_cache.has_changed(path)? {
            return Ok(None);
        }
        let key = path.to_string_lossy().to_string();
        let meta = self.metadata.lock().unwrap().get(&key).cloned();
        let Some(meta) = meta else {
            return Ok(None);
        };
        if let Some(ttl) = self.ttl {
            let age = Utc::now().signed_duration_since(meta.cached_at);
            if age.to_std().unwrap_or(Duration::MAX) >= ttl {
                return Ok(None);
            }
        }
        let payload_path = self.payload_dir.join(safe_name(path));
        if !payload_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&payload_path)?;
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Ok(None),
        }
    }

    pub fn put(
        &self,
        path: &Path,
        language: &str,
        result: &serde_json::Value,
        structure_signature: Option<String>,
    ) -> Result<(), CacheError> {
        let payload_path = self.payload_dir.join(safe_name(path));
        let json = serde_json::to_string(result)?;
        let result_size = json.len();
        let tmp_path = payload_path.with_extension("json.tmp");
        fs::write(&tmp_path, &json)?;
        fs::rename(&tmp_path, &payload_path)?;

        let key = path.to_string_lossy().to_string();
        self.metadata.lock().unwrap().insert(
            key,
            ParseResultMetadata {
                cached_at: Utc::now(),
                language: language.to_string(),
                result_size,
                structure_signature,
            },
        );
        self.persist_metadata()
    }

    fn persist_metadata(&self) -> Result<(), CacheError> {
        let guard = self.metadata.lock().unwrap();
        let json = serde_json::to_string_pretty(&*guard)?;
        let tmp_path = self.metadata_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.metadata_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn cache_coherence_for_unchanged_file() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let file_path = dir.path().join("a.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        let hashes = FileHashCache::load(&cache_dir).unwrap();
        hashes.update(&file_path).unwrap();

        let parse_cache = ParseResultCache::load(&cache_dir, None).unwrap();
        let payload = json!({"entities": ["x"]});
        parse_cache.put(&file_path, "python", &payload, None).unwrap();

        let fetched = parse_cache.get(&file_path, &hashes).unwrap();
        assert_eq!(fetched, Some(payload));
    }

    #[test]
    fn invalidates_when_file_content_changes() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let file_path = dir.path().join("a.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        let hashes = FileHashCache::load(&cache_dir).unwrap();
        hashes.update(&file_path).unwrap();

        let parse_cache = ParseResultCache::load(&cache_dir, None).unwrap();
        parse_cache
            .put(&file_path, "python", &json!({"entities": []}), None)
            .unwrap();

        fs::write(&file_path, "x = 2\n").unwrap();
        assert_eq!(parse_cache.get(&file_path, &hashes).unwrap(), None);
    }
}
