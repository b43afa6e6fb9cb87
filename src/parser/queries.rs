//! Named tree-sitter query files: within a `.scm` file,
//! queries are delimited by `; @query: <name>` marker lines.

use crate::prescan::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Per-language `.scm` filename under the queries directory.
fn query_file_name(language: Language) -> &'static str {
    match language {
        Language::Python => "python.scm",
        Language::JavaScript => "javascript.scm",
        Language::TypeScript => "typescript.scm",
        Language::Go => "go.scm",
        Language::CSharp => "csharp.scm",
        Language::Php => "php.scm",
        Language::Rust => "rust.scm",
    }
}

/// The `queries/` directory shipped alongside this crate, anchored at
/// compile time so it resolves regardless of the process's working
/// directory at run time.
pub fn default_queries_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("queries")
}

/// Reads and parses the named-query file for `language` out of `dir`.
pub fn load_query_set(dir: &Path, language: Language) -> std::io::Result<QuerySet> {
    let path = dir.join(query_file_name(language));
    let text = std::fs::read_to_string(path)?;
    Ok(QuerySet::parse(&text))
}

#[derive(Debug, Default, Clone)]
pub struct QuerySet {
    queries: HashMap<String, String>,
}

impl QuerySet {
    pub fn parse(source: &str) -> Self {
        let mut queries = HashMap::new();
        let mut current_name: Option<String> = None;
        let mut current_body = String::new();

        for line in source.lines() {
            if let Some(name) = line.trim().strip_prefix("; @query:") {
                if let Some(name) = current_name.take() {
                    queries.insert(name, current_body.trim().to_string());
                }
                current_body = String::new();
                current_name = Some(name.trim().to_string());
                continue;
            }
            if current_name.is_some() {
                current_body.push_str(line);
                current_body.push('\n');
            }
        }
        if let Some(name) = current_name {
            queries.insert(name, current_body.trim().to_string());
        }
        Self { queries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.queries.get(name).map(|s| s.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_marker_lines() {
        let src = "; @query: extraction\n(function_definition) @fn\n\n; @query: calls\n(call) @call\n";
        let set = QuerySet::parse(src);
        assert_eq!(set.get("extraction"), Some("(function_definition) @fn"));
        assert_eq!(set.get("calls"), Some("(call) @call"));
    }

    #[test]
    fn ignores_content_before_first_marker() {
        let src = "; a stray comment\n; @query: only\nfoo\n";
        let set = QuerySet::parse(src);
        assert_eq!(set.names().count(), 1);
        assert_eq!(set.get("only"), Some("foo"));
    }

    #[test]
    fn loads_the_shipped_python_query_file() {
        let set = load_query_set(&default_queries_dir(), Language::Python).unwrap();
        assert!(set.get("calls").is_some());
        assert!(set.get("imports").is_some());
        assert!(set.get("exceptions").is_some());
    }
}
