//! Per-language AST-to-entity extraction and the QN registry it populates.

pub mod extractor;
pub mod registry;
pub mod relations;

pub use extractor::{extract_module, ExtractedModule, ScopeEntry};
pub use registry::EntityRegistry;
pub use relations::{extract_relations, ImportRecord, RelationSites};
