//! Configuration surface: feature flags plus the layered loader that
//! resolves them from defaults, `codegraph.toml`, and `CODEGRAPH_*` env
//! vars.

pub mod features;
pub mod loader;

pub use features::{FeatureFlags, ParallelismMode};
pub use loader::{CodeGraphConfig, ConfigService};
