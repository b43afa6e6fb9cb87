//! Tracks the last-indexed HEAD per repository so incremental runs can ask
//! git which paths changed, via `git2` rather than shelling out.

use crate::error::CacheError;
use git2::Repository;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct GitDeltaCache {
    store_path: PathBuf,
    heads: Mutex<HashMap<String, String>>,
}

impl GitDeltaCache {
    pub fn load(cache_dir: &Path) -> Result<Self, CacheError> {
        let store_path = cache_dir.join("git_delta.json");
        let heads = if store_path.exists() {
            let content = fs::read_to_string(&store_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            store_path,
            heads: Mutex::new(heads),
        })
    }

    /// Paths changed between the stored HEAD and the current HEAD of `repo_root`,
    /// plus any new untracked files. `None` when there is no prior HEAD recorded
    /// (caller should fall back to a full walk).
    pub fn changed_paths(&self, repo_root: &Path) -> Result<Option<Vec<PathBuf>>, CacheError> {
        let repo = match Repository::open(repo_root) {
            Ok(repo) => repo,
            Err(_) => return Ok(None),
        };
        let key = repo_root.to_string_lossy().to_string();
        let stored_head = self.heads.lock().unwrap().get(&key).cloned();
        let Some(stored_head) = stored_head else {
            return Ok(None);
        };

        let current_head = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| oid.to_string());
        let Some(current_head) = current_head else {
            return Ok(None);
        };
        if current_head == stored_head {
            return Ok(Some(Vec::new()));
        }

        let old_oid = git2::Oid::from_str(&stored_head).map_err(|e| CacheError::Corrupt {
            path: self.store_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;
        let new_oid = git2::Oid::from_str(&current_head).map_err(|e| CacheError::Corrupt {
            path: self.store_path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;

        let old_tree = repo.find_commit(old_oid).and_then(|c| c.tree()).ok();
        let new_tree = repo.find_commit(new_oid).and_then(|c| c.tree()).ok();
        let diff = repo
            .diff_tree_to_tree(old_tree.as_ref(), new_tree.as_ref(), None)
            .map_err(|e| CacheError::Corrupt {
                path: repo_root.to_string_lossy().to_string(),
                message: e.to_string(),
            })?;

        let mut paths = Vec::new();
        diff.foreach(
            &mut |delta, _| {
                if let Some(p) = delta.new_file().path() {
                    paths.push(repo_root.join(p));
                }
                true
            },
            None,
            None,
            None,
        )
        .map_err(|e| CacheError::Corrupt {
            path: repo_root.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;

        Ok(Some(paths))
    }

    pub fn record_head(&self, repo_root: &Path) -> Result<(), CacheError> {
        let Ok(repo) = Repository::open(repo_root) else {
            return Ok(());
        };
        let Some(head) = repo.head().ok().and_then(|h| h.target()) else {
            return Ok(());
        };
        let key = repo_root.to_string_lossy().to_string();
        self.heads.lock().unwrap().insert(key, head.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.store_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let guard = self.heads.lock().unwrap();
        let json = serde_json::to_string_pretty(&*guard)?;
        let tmp_path = self.store_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.store_path)?;
        Ok(())
    }
}
