//! Decorator/annotation and exception-handling edges, emitted in a pass
//! separate from `ResolverPass` because they read different AST shapes
//! (decorator/attribute lists, try/catch blocks) than call expressions.

use crate::graph::{EdgeIngest, EntityRef, Label, RelationType};
use crate::prescan::Language;

/// `mod.dec(args)` normalizes to the QN `mod.dec` by stripping a leading
/// `@`, truncating at the first `(`, and keeping every dotted segment; the
/// raw text is preserved separately so argument information isn't lost.
pub fn normalize_decorator(raw: &str) -> (String, Vec<String>) {
    let stripped = raw.trim().trim_start_matches('@');
    let before_call = stripped.split('(').next().unwrap_or(stripped).trim();
    let segments: Vec<String> = before_call.split('.').map(|s| s.to_string()).collect();
    (before_call.to_string(), segments)
}

/// Java uses `@Annotation` syntax for what every other supported language
/// calls a decorator; the edge type differs even though the detection and
/// normalization logic is identical.
pub fn decoration_relation(language: Language) -> RelationType {
    match language {
        Language::CSharp => RelationType::Annotates,
        _ => RelationType::Decorates,
    }
}

#[derive(Debug, Clone)]
pub struct DecoratorSite {
    pub target_qn: String,
    pub target_label: Label,
    pub raw_text: String,
    pub module_qn: String,
}

/// Local decorators (no dot, or a single segment already present in the
/// module) get their QN prefixed with the current module so
/// `@route` inside `app.py` resolves to `proj.app.route`, not a bare `route`.
fn decorator_qn(module_qn: &str, normalized: &str) -> String {
    if normalized.contains('.') {
        normalized.to_string()
    } else {
        format!("{}.{}", module_qn, normalized)
    }
}

pub fn link_decorators(language: Language, sites: &[DecoratorSite]) -> Vec<EdgeIngest> {
    let rel_type = decoration_relation(language);
    sites
        .iter()
        .map(|site| {
            let (normalized, _segments) = normalize_decorator(&site.raw_text);
            let decorator_qn = decorator_qn(&site.module_qn, &normalized);
            EdgeIngest::new(
                EntityRef::qn(site.target_label, site.target_qn.clone()),
                rel_type,
                EntityRef::qn(Label::Function, decorator_qn),
            )
            .with("raw_decorator", site.raw_text.clone())
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ThrowSite {
    pub thrower_qn: String,
    pub thrower_label: Label,
    pub exception_type: String,
}

#[derive(Debug, Clone)]
pub struct CatchSite {
    pub catcher_qn: String,
    pub catcher_label: Label,
    pub exception_type: String,
}

pub fn link_throws(project: &str, sites: &[ThrowSite]) -> Vec<EdgeIngest> {
    sites
        .iter()
        .map(|site| {
            let type_qn = format!("{}.type.{}", project, site.exception_type);
            EdgeIngest::new(EntityRef::qn(site.thrower_label, site.thrower_qn.clone()), RelationType::Throws, EntityRef::qn(Label::Type, type_qn))
        })
        .collect()
}

pub fn link_caught_by(project: &str, sites: &[CatchSite]) -> Vec<EdgeIngest> {
    sites
        .iter()
        .map(|site| {
            let type_qn = format!("{}.type.{}", project, site.exception_type);
            EdgeIngest::new(EntityRef::qn(Label::Type, type_qn), RelationType::CaughtBy, EntityRef::qn(site.catcher_label, site.catcher_qn.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_decorator_call_stripping_at_and_args() {
        let (normalized, segments) = normalize_decorator("@app.route('/users', methods=['GET'])");
        assert_eq!(normalized, "app.route");
        assert_eq!(segments, vec!["app".to_string(), "route".to_string()]);
    }

    #[test]
    fn local_decorator_gets_module_prefix() {
        assert_eq!(decorator_qn("proj.app", "cached"), "proj.app.cached");
        assert_eq!(decorator_qn("proj.app", "functools.wraps"), "functools.wraps");
    }

    #[test]
    fn java_uses_annotates_relation() {
        assert_eq!(decoration_relation(Language::CSharp), RelationType::Annotates);
        assert_eq!(decoration_relation(Language::Python), RelationType::Decorates);
    }

    #[test]
    fn decorator_edge_preserves_raw_text_alongside_normalized_qn() {
        let sites = vec![DecoratorSite {
            target_qn: "proj.app.index".to_string(),
            target_label: Label::Function,
            raw_text: "@app.route('/')".to_string(),
            module_qn: "proj.app".to_string(),
        }];
        let edges = link_decorators(Language::Python, &sites);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target.value, "app.route");
        assert_eq!(edges[0].properties.get("raw_decorator").and_then(|v| v.as_str()), Some("@app.route('/')"));
    }
}
