//! Second-pass binding over the fully-ingested entity graph.

pub mod call_resolver;
pub mod cross_file;
pub mod extended_relation;
pub mod type_relation;

pub use call_resolver::{resolve_call, resolve_calls, UnresolvedCall};
pub use cross_file::{CrossFileResolver, CrossFileSummary, ImportGraph};
pub use extended_relation::{link_caught_by, link_decorators, link_throws, normalize_decorator, CatchSite, DecoratorSite, ThrowSite};
pub use type_relation::{link_typed_sites, TypeRelationOutput, TypedSite};
