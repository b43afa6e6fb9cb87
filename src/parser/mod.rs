//! Parser driver and named-query loading.

pub mod driver;
pub mod queries;

pub use driver::{CachedAst, ParserDriver};
pub use queries::{default_queries_dir, load_query_set, QuerySet};
