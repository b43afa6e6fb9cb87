//! Feature flags. Every pass/cache subsystem checks one
//! of these before it runs, so disabling a flag is a no-op skip rather than
//! a branch scattered through the component itself.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParallelismMode {
    Inline,
    ThreadPool,
    WorkerProcess,
}

impl Default for ParallelismMode {
    fn default() -> Self {
        ParallelismMode::ThreadPool
    }
}

impl std::str::FromStr for ParallelismMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(ParallelismMode::Inline),
            "thread-pool" => Ok(ParallelismMode::ThreadPool),
            "worker-process" => Ok(ParallelismMode::WorkerProcess),
            other => Err(format!("unknown parallelism mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub incremental_cache: bool,
    pub git_delta: bool,
    pub framework_linking: bool,
    pub tailwind_processing: bool,
    pub type_inference: bool,
    pub extended_relations: bool,
    pub strict_ingest: bool,
    pub parallelism: ParallelismMode,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            incremental_cache: true,
            git_delta: false,
            framework_linking: true,
            tailwind_processing: true,
            type_inference: true,
            extended_relations: true,
            strict_ingest: false,
            parallelism: ParallelismMode::ThreadPool,
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> Option<bool> {
    match raw.parse::<bool>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring unparseable boolean CODEGRAPH_ override");
            None
        }
    }
}

impl FeatureFlags {
    /// Applies `CODEGRAPH_*` overrides on top of whatever defaults/TOML
    /// already produced. Unrecognized keys and unparseable values are
    /// logged and ignored rather than treated as fatal.
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(flag) = key.strip_prefix("CODEGRAPH_") else {
                continue;
            };
            match flag.to_lowercase().as_str() {
                "incremental_cache" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.incremental_cache = v;
                    }
                }
                "git_delta" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.git_delta = v;
                    }
                }
                "framework_linking" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.framework_linking = v;
                    }
                }
                "tailwind_processing" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.tailwind_processing = v;
                    }
                }
                "type_inference" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.type_inference = v;
                    }
                }
                "extended_relations" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.extended_relations = v;
                    }
                }
                "strict_ingest" => {
                    if let Some(v) = parse_bool(&key, &value) {
                        self.strict_ingest = v;
                    }
                }
                "parallelism" => match value.parse::<ParallelismMode>() {
                    Ok(mode) => self.parallelism = mode,
                    Err(message) => tracing::warn!(key = %key, value = %value, message, "ignoring unparseable CODEGRAPH_ override"),
                },
                _ => tracing::warn!(key = %key, "ignoring unknown CODEGRAPH_ env key"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_conservative_table() {
        let flags = FeatureFlags::default();
        assert!(flags.incremental_cache);
        assert!(!flags.git_delta);
        assert!(flags.framework_linking);
        assert!(flags.tailwind_processing);
        assert!(flags.type_inference);
        assert!(flags.extended_relations);
        assert!(!flags.strict_ingest);
        assert_eq!(flags.parallelism, ParallelismMode::ThreadPool);
    }

    #[test]
    fn env_override_toggles_a_known_flag() {
        let mut flags = FeatureFlags::default();
        flags.apply_env_overrides(vec![("CODEGRAPH_GIT_DELTA".to_string(), "true".to_string())]);
        assert!(flags.git_delta);
    }

    #[test]
    fn unknown_env_key_is_ignored_not_fatal() {
        let mut flags = FeatureFlags::default();
        flags.apply_env_overrides(vec![("CODEGRAPH_NOT_A_FLAG".to_string(), "true".to_string())]);
        assert_eq!(flags, FeatureFlags::default());
    }

    #[test]
    fn unparseable_parallelism_value_leaves_previous_setting() {
        let mut flags = FeatureFlags::default();
        flags.apply_env_overrides(vec![("CODEGRAPH_PARALLELISM".to_string(), "turbo".to_string())]);
        assert_eq!(flags.parallelism, ParallelismMode::ThreadPool);
    }
}
