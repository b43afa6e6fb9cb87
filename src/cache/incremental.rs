//! Facade composing the hash, parse-result, and git-delta caches into the
//! single question the orchestrator actually asks: does this file need
//! reparsing, and if not, what did we already compute for it.

use crate::cache::file_hash::FileHashCache;
use crate::cache::git_delta::GitDeltaCache;
use crate::cache::parse_result::ParseResultCache;
use crate::error::CacheError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct IncrementalCache {
    pub hashes: FileHashCache,
    pub parse_results: ParseResultCache,
    pub git_delta: GitDeltaCache,
}

impl IncrementalCache {
    pub fn load(cache_dir: &Path, parse_result_ttl: Option<Duration>) -> Result<Self, CacheError> {
        Ok(Self {
            hashes: FileHashCache::load(cache_dir)?,
            parse_results: ParseResultCache::load(cache_dir, parse_result_ttl)?,
            git_delta: GitDeltaCache::load(cache_dir)?,
        })
    }

    pub fn needs_parsing(&self, path: &Path) -> Result<bool, CacheError> {
        self.hashes.has_changed(path)
    }

    pub fn get_result(&self, path: &Path) -> Result<Option<serde_json::Value>, CacheError> {
        if self.needs_parsing(path)? {
            return Ok(None);
        }
        self.parse_results.get(path, &self.hashes)
    }

    pub fn cache_result(
        &self,
        path: &Path,
        language: &str,
        result: &serde_json::Value,
        structure_signature: Option<String>,
    ) -> Result<(), CacheError> {
        self.hashes.update(path)?;
        self.parse_results
            .put(path, language, result, structure_signature)
    }

    /// Restricts a full file list to the subset git reports as changed since
    /// the last indexed HEAD, when `git_delta` tracking is enabled and a prior
    /// HEAD is on record. Falls back to the full list otherwise.
    pub fn restrict_to_changed(
        &self,
        repo_root: &Path,
        all_files: Vec<PathBuf>,
    ) -> Result<Vec<PathBuf>, CacheError> {
        match self.git_delta.changed_paths(repo_root)? {
            Some(changed) => {
                let changed: std::collections::HashSet<_> = changed.into_iter().collect();
                Ok(all_files
                    .into_iter()
                    .filter(|p| changed.contains(p))
                    .collect())
            }
            None => Ok(all_files),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn warm_run_reuses_cached_result() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let file_path = dir.path().join("a.py");
        fs::write(&file_path, "x = 1\n").unwrap();

        let cache = IncrementalCache::load(&cache_dir, None).unwrap();
        assert!(cache.needs_parsing(&file_path).unwrap());
        cache
            .cache_result(&file_path, "python", &json!({"entities": ["x"]}), None)
            .unwrap();
        assert!(!cache.needs_parsing(&file_path).unwrap());
        assert_eq!(
            cache.get_result(&file_path).unwrap(),
            Some(json!({"entities": ["x"]}))
        );
    }
}
