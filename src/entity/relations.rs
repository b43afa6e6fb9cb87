//! Query-based relation extraction: runs the named tree-sitter queries under
//! `queries/` against an already-parsed tree to recover call sites, imports,
//! decorator/annotation sites, and throw/catch sites. Containment (modules,
//! classes, functions, methods) and inheritance come from the direct walk in
//! `entity::extractor` instead, since those need parent/child structure the
//! query captures don't carry.

use crate::entity::extractor::ScopeEntry;
use crate::graph::Label;
use crate::parser::{load_query_set, ParserDriver};
use crate::prescan::Language;
use crate::resolver::{CatchSite, DecoratorSite, ThrowSite, UnresolvedCall};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Node, QueryCursor, Tree};

/// One resolved `alias -> target module` pair read off an import statement.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub alias: String,
    pub target_module: String,
}

#[derive(Debug, Default)]
pub struct RelationSites {
    pub calls: Vec<UnresolvedCall>,
    pub imports: Vec<ImportRecord>,
    pub decorator_sites: Vec<DecoratorSite>,
    pub throw_sites: Vec<ThrowSite>,
    pub catch_sites: Vec<CatchSite>,
}

fn strip_import_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    if trimmed.len() >= 2 {
        let first = bytes[0];
        if (first == b'"' || first == b'\'' || first == b'`') && bytes[trimmed.len() - 1] == first {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

fn owner_at<'a>(scopes: &'a [ScopeEntry], module_qn: &'a str, pos: usize) -> (&'a str, Label) {
    scopes
        .iter()
        .filter(|s| s.range.contains(&pos) && matches!(s.label, Label::Function | Label::Method | Label::Module))
        .min_by_key(|s| s.range.end - s.range.start)
        .map(|s| (s.qn.as_str(), s.label))
        .unwrap_or((module_qn, Label::Module))
}

fn nearest_class_qn(scopes: &[ScopeEntry], pos: usize) -> Option<String> {
    scopes
        .iter()
        .filter(|s| s.range.contains(&pos) && matches!(s.label, Label::Class | Label::Interface))
        .min_by_key(|s| s.range.end - s.range.start)
        .map(|s| s.qn.clone())
}

fn process_match(
    sites: &mut RelationSites,
    caps: &HashMap<&str, Node>,
    source: &str,
    module_qn: &str,
    scopes: &[ScopeEntry],
) {
    let text = |n: &Node| -> String { source[n.byte_range()].to_string() };

    if let Some(callee) = caps.get("call.callee") {
        let pos = callee.start_byte();
        let (caller_qn, caller_label) = owner_at(scopes, module_qn, pos);
        let receiver_qn_prefix = caps.get("call.receiver").and_then(|r| {
            let receiver_text = text(r);
            if receiver_text == "self" || receiver_text == "this" {
                nearest_class_qn(scopes, pos)
            } else {
                None
            }
        });
        sites.calls.push(UnresolvedCall {
            caller_qn: caller_qn.to_string(),
            caller_label,
            callee_simple_name: text(callee),
            receiver_qn_prefix,
            defining_module: None,
        });
        return;
    }

    if let Some(module_node) = caps.get("import.module") {
        let raw = strip_import_quotes(&text(module_node));
        let alias = caps
            .get("import.name")
            .map(|n| text(n))
            .unwrap_or_else(|| raw.rsplit(['/', '.', '\\']).next().unwrap_or(&raw).to_string());
        sites.imports.push(ImportRecord { alias, target_module: raw });
        return;
    }

    for key in ["throw.type", "throw.macro", "throw.callee"] {
        if let Some(throw_node) = caps.get(key) {
            let pos = throw_node.start_byte();
            let (qn, label) = owner_at(scopes, module_qn, pos);
            sites.throw_sites.push(ThrowSite {
                thrower_qn: qn.to_string(),
                thrower_label: label,
                exception_type: text(throw_node),
            });
            return;
        }
    }

    if let Some(catch_type) = caps.get("catch.type") {
        let pos = catch_type.start_byte();
        let (qn, label) = owner_at(scopes, module_qn, pos);
        sites.catch_sites.push(CatchSite {
            catcher_qn: qn.to_string(),
            catcher_label: label,
            exception_type: text(catch_type),
        });
        return;
    }

    let decorator_node = caps.get("decorator.raw").or_else(|| caps.get("annotation.raw"));
    if let Some(raw_node) = decorator_node {
        let locate = caps.get("decorator.target").unwrap_or(raw_node);
        let pos = locate.start_byte();
        let (qn, label) = owner_at(scopes, module_qn, pos);
        sites.decorator_sites.push(DecoratorSite {
            target_qn: qn.to_string(),
            target_label: label,
            raw_text: text(raw_node),
            module_qn: module_qn.to_string(),
        });
    }
}

/// Runs every named query group for `language` against `tree`, attributing
/// each capture to the innermost scope in `scopes` that contains it.
pub fn extract_relations(
    driver: &ParserDriver,
    queries_dir: &Path,
    module_qn: &str,
    language: Language,
    tree: &Tree,
    source: &str,
    scopes: &[ScopeEntry],
) -> RelationSites {
    let mut sites = RelationSites::default();

    let query_set = match load_query_set(queries_dir, language) {
        Ok(set) => set,
        Err(_) => return sites,
    };

    for name in query_set.names().map(|s| s.to_string()).collect::<Vec<_>>() {
        let Some(query_src) = query_set.get(&name) else { continue };
        let Ok(query) = driver.compiled_query(language, &name, query_src) else { continue };

        let mut cursor = QueryCursor::new();
        let capture_names: Vec<String> = query.capture_names().to_vec();
        let matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
        for m in matches {
            let mut by_name: HashMap<&str, Node> = HashMap::new();
            for cap in m.captures {
                by_name.insert(capture_names[cap.index as usize].as_str(), cap.node);
            }
            process_match(&mut sites, &by_name, source, module_qn, scopes);
        }
    }

    sites
}
