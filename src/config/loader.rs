//! `ConfigService`: defaults, then `codegraph.toml` if present, then
//! `CODEGRAPH_*` environment overrides, then validation.
//! Unknown TOML keys and env keys are logged and ignored, never fatal.

use crate::config::features::FeatureFlags;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeGraphConfig {
    pub project_root: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub features: FeatureFlags,
}

impl Default for CodeGraphConfig {
    fn default() -> Self {
        Self { project_root: None, cache_dir: None, features: FeatureFlags::default() }
    }
}

impl CodeGraphConfig {
    /// No flag-specific invariants today; reserved for cross-field checks
    /// (e.g. `git_delta` requiring `incremental_cache`) as they're added.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.git_delta && !self.features.incremental_cache {
            return Err(ConfigError::Invalid {
                field: "git_delta".to_string(),
                message: "git_delta requires incremental_cache to be enabled".to_string(),
            });
        }
        Ok(())
    }
}

pub struct ConfigService;

impl ConfigService {
    /// Loads from `path` if it exists, layers `std::env::vars()` on top,
    /// and validates. A missing file is not an error; a malformed one is.
    pub fn load(path: &Path) -> Result<CodeGraphConfig, ConfigError> {
        let env_vars = std::env::vars().filter(|(k, _)| k.starts_with("CODEGRAPH_"));
        Self::load_from(path, env_vars)
    }

    pub fn load_from(path: &Path, env_vars: impl IntoIterator<Item = (String, String)>) -> Result<CodeGraphConfig, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?
        } else {
            CodeGraphConfig::default()
        };

        config.features.apply_env_overrides(env_vars);
        config.validate()?;
        Ok(config)
    }

    /// Default config-file location: `<project_root>/codegraph.toml`.
    pub fn default_path(project_root: &Path) -> PathBuf {
        project_root.join("codegraph.toml")
    }
}
