//! Crate-wide error type.
//!
//! Each pipeline component defines a narrow error enum for its own failure
//! modes and converts into `IndexError` via `#[from]`, so call sites can
//! `?` across component boundaries without losing which stage failed.

use thiserror::Error;

/// Failure while walking or reading a file from disk.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(String),
}

/// Failure producing or reading a tree-sitter AST.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no grammar registered for language {0}")]
    UnsupportedLanguage(String),

    #[error("tree-sitter failed to produce a tree for {0}")]
    NoTree(String),

    #[error("query compile error in {query} for {language}: {message}")]
    Query {
        language: String,
        query: String,
        message: String,
    },
}

/// Failure turning an AST into entities.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("entity extraction failed for {file}: {message}")]
    Extraction { file: String, message: String },

    #[error("duplicate qualified name emitted with conflicting label: {0}")]
    QnCollision(String),
}

/// Failure during cross-file resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("unresolvable self-reference in {0}")]
    SelfCycle(String),

    #[error("decorator normalization failed: {0}")]
    DecoratorFormat(String),
}

/// Failure in the cache subsystems.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache directory unavailable: {0}")]
    NoCacheDir(String),

    #[error("corrupt cache entry at {path}: {message}")]
    Corrupt { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Failure reported back from the ingestor sink.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("ensure_node failed for {label}:{key}: {message}")]
    Node {
        label: String,
        key: String,
        message: String,
    },

    #[error("ensure_relationship failed for {rel_type}: {message}")]
    Relationship { rel_type: String, message: String },
}

/// Failure in the job scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("job {0} timed out")]
    Timeout(String),

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("worker pool shut down while jobs were still queued")]
    ShutdownWhileQueued,

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Failure loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Unified error type for the indexing pipeline.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_component_errors_by_kind() {
        let err: IndexError = CacheError::NoCacheDir("no $HOME".into()).into();
        assert!(matches!(err, IndexError::Cache(_)));
        assert!(err.to_string().contains("no $HOME"));
    }

    #[test]
    fn scheduler_error_displays_job_id() {
        let err = SchedulerError::JobNotFound("job-42".into());
        assert_eq!(err.to_string(), "job job-42 not found");
    }
}
