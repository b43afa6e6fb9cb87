//! Strategy-chain type inference.

pub mod context;
pub mod engine;
pub mod registry;

pub use context::{InferenceContext, Scope, ScopeKind};
pub use engine::{TypeInferenceEngine, TypeInferenceResult, TypeSource};
pub use registry::TypeRegistry;
