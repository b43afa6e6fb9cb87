//! Multi-language code-graph indexer: tree-sitter parsing, framework
//! linking, and cross-file resolution over a property graph.
//!
//! # Architecture
//!
//! Leaves-first dependency order: generic caches, then the pre-scanner and
//! parser driver, then per-language entity extraction, then framework
//! linking and type inference, then the cross-file resolver passes, all
//! wired together by an `Orchestrator` that consumes `ConfigService`-loaded
//! `FeatureFlags` and a shared `Context`.
//!
//! ```text
//! cache -> prescan -> parser -> entity -> framework/inference -> resolver -> ingestor
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod framework;
pub mod graph;
pub mod inference;
pub mod ingestor;
pub mod orchestrator;
pub mod parser;
pub mod prescan;
pub mod resolver;
pub mod scheduler;

pub use config::{CodeGraphConfig, ConfigService, FeatureFlags, ParallelismMode};
pub use context::Context;
pub use error::{IndexError, Result};
pub use graph::{EdgeIngest, EntityRef, Label, NodeIngest, PropertyMap, RelationType};
pub use ingestor::{IngestorSink, RecordingSink};
pub use orchestrator::{Orchestrator, PipelineSummary, ResolverInputs, SourceFile};
pub use prescan::{DiscoveredFile, Language, PreScanIndex, PreScanner};
pub use scheduler::{BatchResult, ExecutionMode, JobId, JobRecord, JobStatus, ProcessManager, Progress};

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Returns the library version as a semantic version string.
pub fn version() -> String {
    format!("{}.{}.{}", VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_is_semver() {
        assert_eq!(version(), "0.1.0");
    }
}
