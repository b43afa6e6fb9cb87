//! Tree-sitter-backed AST production with a shared AST cache.
//!
//! The AST cache keys on absolute file path and stores the parsed tree
//! alongside the source buffer it points into, since tree-sitter node
//! ranges are only meaningful against that buffer. Eviction drops both
//! together.

use crate::cache::CacheManager;
use crate::error::ParseError;
use crate::prescan::Language;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tree_sitter::{Parser, Query, Tree};

pub struct CachedAst {
    pub tree: Arc<Tree>,
    pub source: Arc<String>,
    pub language: Language,
}

fn grammar_for(language: Language) -> Result<tree_sitter::Language, ParseError> {
    Ok(match language {
        Language::Python => tree_sitter_python::language(),
        Language::JavaScript => tree_sitter_javascript::language(),
        Language::TypeScript => tree_sitter_typescript::language_typescript(),
        Language::Go => tree_sitter_go::language(),
        Language::Rust => tree_sitter_rust::language(),
        Language::CSharp => tree_sitter_c_sharp::language(),
        Language::Php => tree_sitter_php::language(),
    })
}

/// Owns the compiled grammars, a per-`(language, query_name)` compiled query
/// cache, and the shared AST cache. Parsing one file never aborts the run:
/// callers get `Err` for that file and continue with the rest.
pub struct ParserDriver {
    ast_cache: Mutex<CacheManager<CachedAst>>,
    query_cache: Mutex<HashMap<(Language, String), Arc<Query>>>,
}

impl ParserDriver {
    pub fn new(ast_cache_capacity: usize, ast_cache_ttl: Option<Duration>) -> Self {
        Self {
            ast_cache: Mutex::new(CacheManager::with_ttl(ast_cache_capacity, ast_cache_ttl)),
            query_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Parses `source` for `file_key` (an absolute path used only as the cache
    /// key) and returns the tree. A tree containing ERROR nodes is returned
    /// successfully; only a hard tree-sitter failure is an `Err`.
    pub fn parse(
        &self,
        file_key: &str,
        language: Language,
        source: String,
    ) -> Result<(Arc<Tree>, Arc<String>), ParseError> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar_for(language)?)
            .map_err(|e| ParseError::Query {
                language: format!("{:?}", language),
                query: "<grammar>".to_string(),
                message: e.to_string(),
            })?;

        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::NoTree(file_key.to_string()))?;

        let tree = Arc::new(tree);
        let source = Arc::new(source);

        self.ast_cache.lock().unwrap().set(
            file_key,
            CachedAst {
                tree: tree.clone(),
                source: source.clone(),
                language,
            },
        );

        Ok((tree, source))
    }

    pub fn cached(&self, file_key: &str) -> Option<(Arc<Tree>, Arc<String>, Language)> {
        self.ast_cache
            .lock()
            .unwrap()
            .get(file_key)
            .map(|c| (c.tree.clone(), c.source.clone(), c.language))
    }

    pub fn evict(&self, file_key: &str) {
        self.ast_cache.lock().unwrap().remove(file_key);
    }

    pub fn compiled_query(
        &self,
        language: Language,
        name: &str,
        source: &str,
    ) -> Result<Arc<Query>, ParseError> {
        let key = (language, name.to_string());
        if let Some(query) = self.query_cache.lock().unwrap().get(&key) {
            return Ok(query.clone());
        }
        let grammar = grammar_for(language)?;
        let query = Query::new(grammar, source).map_err(|e| ParseError::Query {
            language: format!("{:?}", language),
            query: name.to_string(),
            message: e.to_string(),
        })?;
        let query = Arc::new(query);
        self.query_cache.lock().unwrap().insert(key, query.clone());
        Ok(query)
    }
}
