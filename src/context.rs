//! Shared state threaded through every pass: registries, caches, and the
//! ingestor handle.
//!
//! Each pass borrows only the fields it needs; nothing here is a hidden
//! singleton; a new run builds a fresh `Context` (incremental mode rebuilds
//! registries from the AST cache rather than trusting stale in-memory state).

use crate::cache::IncrementalCache;
use crate::entity::EntityRegistry;
use crate::inference::InferenceContext;
use crate::ingestor::IngestorSink;
use crate::parser::ParserDriver;
use crate::prescan::PreScanIndex;
use std::sync::{Arc, Mutex};

pub struct Context {
    pub project_name: String,
    pub entity_registry: Mutex<EntityRegistry>,
    pub prescan_index: Mutex<PreScanIndex>,
    /// Import aliases and scope bindings accumulated across every file's
    /// extraction pass, shared because `InferenceContext` resolves imports
    /// by alias rather than per-module.
    pub inference_context: Mutex<InferenceContext>,
    pub parser_driver: ParserDriver,
    pub incremental: Option<IncrementalCache>,
    pub ingestor: Arc<dyn IngestorSink>,
}

impl Context {
    pub fn new(project_name: impl Into<String>, ingestor: Arc<dyn IngestorSink>, ast_cache_capacity: usize) -> Self {
        Self {
            project_name: project_name.into(),
            entity_registry: Mutex::new(EntityRegistry::default()),
            prescan_index: Mutex::new(PreScanIndex::default()),
            inference_context: Mutex::new(InferenceContext::default()),
            parser_driver: ParserDriver::new(ast_cache_capacity, None),
            incremental: None,
            ingestor,
        }
    }

    pub fn with_incremental(mut self, incremental: IncrementalCache) -> Self {
        self.incremental = Some(incremental);
        self
    }
}
