//! Tailwind utility-class extraction from markup attributes and CSS at-rules.

use regex::Regex;
use std::sync::OnceLock;

macro_rules! re {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

re!(
    class_attr,
    r#"(?is)\b(?:class|className)\s*=\s*(?P<value>"[^"]*"|'[^']*'|`[^`]*`|\{[^{}]*\})"#
);
re!(classnames_call, r"\b(?:classnames|clsx)\s*\((?P<args>[\s\S]*?)\)");
re!(string_literal, r#"['"]([^'"]+)['"]"#);
re!(object_key_quoted, r#"['"]([^'"]+)['"]\s*:"#);
re!(object_key_bare, r"\b([A-Za-z0-9_-]+)\s*:");
re!(template_hole, r"\$\{([^}]*)\}");
re!(apply_directive, r"@apply\s+([^;}]+)");
re!(source_inline, r#"(?i)@source\s+inline\(\s*['"]([^'"]+)['"]\s*\)"#);
re!(at_rule, r"@[A-Za-z-]+[^;{]*[;{]");

fn strip_quotes(text: &str) -> String {
    let trimmed = text.trim();
    let bytes = trimmed.as_bytes();
    if trimmed.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"' || first == b'`') && bytes[trimmed.len() - 1] == first {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

fn split_class_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(|s| s.to_string()).collect()
}

fn extract_string_literals(text: &str) -> Vec<String> {
    string_literal().captures_iter(text).map(|c| c[1].to_string()).collect()
}

fn extract_object_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = object_key_quoted().captures_iter(text).map(|c| c[1].to_string()).collect();
    keys.extend(object_key_bare().captures_iter(text).map(|c| c[1].to_string()));
    keys
}

fn extract_from_template_literal(body: &str) -> Vec<String> {
    let mut classes = split_class_list(body);
    for hole in template_hole().captures_iter(body) {
        classes.extend(extract_string_literals(&hole[1]));
    }
    classes
}

/// Mirrors the original's value-kind dispatch: template literal, array
/// literal, object literal (classnames-style), or a plain space-separated list.
pub fn extract_classes_from_value(value: &str) -> Vec<String> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return Vec::new();
    }
    if cleaned.starts_with('`') && cleaned.ends_with('`') && cleaned.len() >= 2 {
        return extract_from_template_literal(&cleaned[1..cleaned.len() - 1]);
    }
    if cleaned.starts_with('[') && cleaned.ends_with(']') {
        return extract_string_literals(cleaned);
    }
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        return extract_object_keys(cleaned);
    }
    split_class_list(cleaned)
}

/// Extracts classes from a JSX expression container: `clsx(...)`, an array,
/// an object, or a bare string/template expression.
pub fn extract_classes_from_expression(expr: &str) -> Vec<String> {
    let mut cleaned = expr.trim();
    if cleaned.starts_with('(') && cleaned.ends_with(')') {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    if let Some(idx) = cleaned.find(".join") {
        if cleaned.trim_start().starts_with('[') {
            cleaned = cleaned[..idx].trim();
        }
    }

    let mut classes = Vec::new();
    for call in classnames_call().captures_iter(cleaned) {
        let args = &call["args"];
        classes.extend(extract_string_literals(args));
        for obj in Regex::new(r"\{[^}]*\}").unwrap().captures_iter(args) {
            classes.extend(extract_object_keys(&obj[0]));
        }
    }

    if cleaned.starts_with('[') && cleaned.ends_with(']') {
        classes.extend(extract_string_literals(cleaned));
        return classes;
    }
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        classes.extend(extract_object_keys(cleaned));
        return classes;
    }
    if cleaned.starts_with('`') && cleaned.ends_with('`') && cleaned.len() >= 2 {
        classes.extend(extract_from_template_literal(&cleaned[1..cleaned.len() - 1]));
        return classes;
    }

    classes.extend(extract_string_literals(cleaned));
    classes
}

/// Trims, strips a trailing `!important`, and rejects template placeholders
/// or stray brace fragments left over from a bad split.
pub fn normalize_utility(value: &str) -> Option<String> {
    let cleaned = value.trim().trim_end_matches(';').trim();
    let cleaned = Regex::new(r"\s*!important$").unwrap().replace(cleaned, "").to_string();
    if cleaned.is_empty() || cleaned.contains("{{") || cleaned.contains("}}") || cleaned.starts_with('{') || cleaned.ends_with('}') {
        return None;
    }
    Some(cleaned)
}

/// Scans an HTML/JSX fragment for `class=`/`className=` attributes and
/// returns the normalized utility names in use.
pub fn scan_markup(source: &str) -> Vec<String> {
    let mut utilities = Vec::new();
    for m in class_attr().captures_iter(source) {
        let raw = &m["value"];
        let classes = if raw.starts_with('{') {
            extract_classes_from_expression(&raw[1..raw.len() - 1])
        } else {
            extract_classes_from_value(&strip_quotes(raw))
        };
        utilities.extend(classes.into_iter().filter_map(|c| normalize_utility(&c)));
    }
    utilities
}

pub struct CssRuleResult {
    pub utilities: Vec<String>,
    pub source_inline: Vec<String>,
    pub uses_tailwind_directive: bool,
}

/// Scans a CSS/SCSS file for `@apply`, `@source inline(...)`, `@tailwind`, and `@layer` at-rules.
pub fn scan_stylesheet(source: &str) -> CssRuleResult {
    let mut utilities = Vec::new();
    let mut source_inline = Vec::new();
    let mut uses_tailwind_directive = false;

    for rule in at_rule().find_iter(source) {
        let rule_text = rule.as_str();
        if rule_text.contains("@apply") {
            if let Some(caps) = apply_directive().captures(rule_text) {
                utilities.extend(caps[1].split_whitespace().filter_map(normalize_utility));
            }
        }
        if rule_text.contains("@source") {
            source_inline.extend(source_inline_from(rule_text));
        }
        if rule_text.contains("@tailwind") || rule_text.contains("@layer") {
            uses_tailwind_directive = true;
        }
    }

    CssRuleResult { utilities, source_inline, uses_tailwind_directive }
}

fn source_inline_from(rule_text: &str) -> Vec<String> {
    source_inline().captures_iter(rule_text).map(|c| c[1].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_plain_class_attribute() {
        let utilities = scan_markup(r#"<div class="flex items-center gap-2">"#);
        assert_eq!(utilities, vec!["flex", "items-center", "gap-2"]);
    }

    #[test]
    fn scans_clsx_expression_with_object_literal() {
        let utilities = extract_classes_from_expression(r#"clsx("flex", { "text-red-500": isError })"#);
        assert!(utilities.contains(&"flex".to_string()));
        assert!(utilities.contains(&"text-red-500".to_string()));
    }

    #[test]
    fn normalize_drops_template_placeholders() {
        assert_eq!(normalize_utility("bg-{{color}}"), None);
        assert_eq!(normalize_utility("text-red-500 !important"), Some("text-red-500".to_string()));
    }

    #[test]
    fn scans_apply_directive_in_stylesheet() {
        let result = scan_stylesheet(".btn { @apply px-4 py-2 rounded; }");
        assert_eq!(result.utilities, vec!["px-4", "py-2", "rounded"]);
        assert!(!result.uses_tailwind_directive);
    }

    #[test]
    fn scans_tailwind_and_source_directives() {
        let result = scan_stylesheet("@tailwind utilities;\n@source inline('grid-cols-{1..12}');");
        assert!(result.uses_tailwind_directive);
        assert_eq!(result.source_inline, vec!["grid-cols-{1..12}".to_string()]);
    }
}
