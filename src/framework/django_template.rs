//! Django/Jinja-style template tag, variable, include, and extends
//! extraction.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{%\s*([a-zA-Z_][\w-]*)\b").unwrap())
}

fn var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([^}]+?)\s*\}\}").unwrap())
}

fn include_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\{%\s*include\s+['"]([^'"]+)['"]"#).unwrap())
}

fn extends_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\{%\s*extends\s+['"]([^'"]+)['"]"#).unwrap())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateExtraction {
    pub tags: Vec<String>,
    pub variables: Vec<String>,
    pub includes: Vec<String>,
    pub extends: Vec<String>,
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

fn normalize_template_name(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').replace('\\', "/")
}

/// Splits each `{{ var }}` on `|` (filters) and `.` (attribute access),
/// keeping only the root variable name.
fn root_variable(raw: &str) -> Option<String> {
    let without_filter = raw.split('|').next()?.trim();
    let root = without_filter.split('.').next()?.trim();
    if root.is_empty() {
        None
    } else {
        Some(root.to_string())
    }
}

pub fn parse_template(source: &str) -> TemplateExtraction {
    let tags = dedup(tag_pattern().captures_iter(source).map(|c| c[1].to_string()));
    let variables = dedup(
        var_pattern()
            .captures_iter(source)
            .filter_map(|c| root_variable(&c[1])),
    );
    let includes = include_pattern().captures_iter(source).map(|c| normalize_template_name(&c[1])).collect();
    let extends = extends_pattern().captures_iter(source).map(|c| normalize_template_name(&c[1])).collect();
    TemplateExtraction { tags, variables, includes, extends }
}

/// Looks plausibly like a Django/Jinja template — callers skip the regex
/// pass entirely on files without either delimiter.
pub fn looks_like_template(source: &str) -> bool {
    source.contains("{{") || source.contains("{%")
}

/// Indexes every `.html`/`.htm` file under `root` by full relative path,
/// bare filename, and the suffix after a `templates/` directory, so
/// `{% include %}`/`{% extends %}` references resolve regardless of which
/// form the template author used.
pub fn build_template_index(root: &Path, html_files: impl Iterator<Item = PathBuf>) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for file_path in html_files {
        let Ok(rel_path) = file_path.strip_prefix(root) else { continue };
        let rel = rel_path.to_string_lossy().replace('\\', "/");
        index.entry(rel.clone()).or_insert_with(|| rel.clone());
        if let Some(filename) = file_path.file_name().and_then(|f| f.to_str()) {
            index.entry(filename.to_string()).or_insert_with(|| rel.clone());
        }
        if let Some(suffix_idx) = rel.find("/templates/") {
            let suffix = rel[suffix_idx + "/templates/".len()..].to_string();
            index.entry(suffix).or_insert(rel);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tags_variables_and_filtered_attribute_access() {
        let source = "{% extends 'base.html' %}{% block content %}{{ user.name|upper }}{% endblock %}";
        let extraction = parse_template(source);
        assert_eq!(extraction.extends, vec!["base.html"]);
        assert!(extraction.tags.contains(&"block".to_string()));
        assert!(extraction.tags.contains(&"endblock".to_string()));
        assert_eq!(extraction.variables, vec!["user"]);
    }

    #[test]
    fn deduplicates_repeated_tags_and_variables() {
        let source = "{% if a %}{{ a }}{% endif %}{% if b %}{{ a }}{% endif %}";
        let extraction = parse_template(source);
        assert_eq!(extraction.variables, vec!["a"]);
        assert_eq!(extraction.tags.iter().filter(|t| *t == "if").count(), 1);
    }

    #[test]
    fn resolves_include_through_templates_suffix() {
        let root = Path::new("/repo");
        let files = vec![PathBuf::from("/repo/app/templates/partials/header.html")];
        let index = build_template_index(root, files.into_iter());
        assert_eq!(
            index.get("partials/header.html").cloned(),
            Some("app/templates/partials/header.html".to_string())
        );
        assert_eq!(index.get("header.html").cloned(), Some("app/templates/partials/header.html".to_string()));
    }

    #[test]
    fn skips_non_template_content() {
        assert!(!looks_like_template("plain text with no markers"));
        assert!(looks_like_template("{{ value }}"));
    }
}
