//! Deterministic endpoint-path normalization. The
//! resulting `(base_url, path)` and endpoint QN must be stable under
//! template-hole substitution so the same route reported two different
//! ways collapses to one node.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn template_hole() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{[^}]*\}").unwrap())
}

fn colon_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap())
}

fn brace_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap())
}

fn bracket_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[A-Za-z_.]+\]").unwrap())
}

fn double_slash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/{2,}").unwrap())
}

/// Substitutes `${VAR}` / `process.env.VAR` / `import.meta.env.VAR` from a
/// `.env`-style map, then the process environment, leaving the literal text
/// behind when neither source has a value.
pub fn resolve_env_vars(raw: &str, env_file_vars: &HashMap<String, String>) -> String {
    let mut resolved = raw.to_string();
    for caps in template_hole().captures_iter(raw) {
        let whole = caps.get(0).unwrap().as_str();
        let inner = &whole[2..whole.len() - 1];
        let var_name = inner
            .trim_start_matches("process.env.")
            .trim_start_matches("import.meta.env.")
            .trim();
        if let Some(value) = env_file_vars.get(var_name).cloned().or_else(|| std::env::var(var_name).ok()) {
            resolved = resolved.replacen(whole, &value, 1);
        }
    }
    resolved
}

/// Step 2+: any remaining `${…}`, Express/Rails `:id`, and bracketed
/// `{id}`/`[id]` path params collapse to the single literal `{param}`.
pub fn normalize_path_params(path: &str) -> String {
    let step1 = template_hole().replace_all(path, "{param}");
    let step2 = colon_param().replace_all(&step1, "{param}");
    let step3 = brace_param().replace_all(&step2, "{param}");
    let step4 = bracket_param().replace_all(&step3, "{param}");
    step4.into_owned()
}

/// Splits a fully-qualified URL into `(Some(base_url), path)`, or `(None, path)`
/// when `raw` was already relative.
pub fn split_base_and_path(raw: &str) -> (Option<String>, String) {
    if let Some(scheme_end) = raw.find("://") {
        let after_scheme = &raw[scheme_end + 3..];
        if let Some(slash) = after_scheme.find('/') {
            let base = &raw[..scheme_end + 3 + slash];
            let path = &after_scheme[slash..];
            return (Some(base.to_string()), path.to_string());
        }
        return (Some(raw.to_string()), "/".to_string());
    }
    (None, raw.to_string())
}

/// Step 4: collapse repeated slashes, force a leading slash, and strip a
/// trailing slash unless the whole path is `/`.
pub fn normalize_slashes(path: &str) -> String {
    let collapsed = double_slash().replace_all(path, "/");
    let leading = if collapsed.starts_with('/') {
        collapsed.into_owned()
    } else {
        format!("/{}", collapsed)
    };
    if leading.len() > 1 && leading.ends_with('/') {
        leading.trim_end_matches('/').to_string()
    } else {
        leading
    }
}

/// Full pipeline from a raw path expression to the normalized path used in
/// the endpoint QN.
pub fn normalize_endpoint_path(raw: &str, env_file_vars: &HashMap<String, String>) -> String {
    let resolved = resolve_env_vars(raw, env_file_vars);
    let (_, path) = split_base_and_path(&resolved);
    let with_params = normalize_path_params(&path);
    normalize_slashes(&with_params)
}

/// `project.endpoint.<framework>.<METHOD>:<normalized_path>` — stable under
/// the transforms above.
pub fn endpoint_qn(project: &str, framework: &str, method: &str, raw_path: &str, env_file_vars: &HashMap<String, String>) -> String {
    let normalized = normalize_endpoint_path(raw_path, env_file_vars);
    format!(
        "{}.endpoint.{}.{}:{}",
        project,
        framework,
        method.to_uppercase(),
        normalized
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_endpoint_path_is_idempotent(segments in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 0..6)) {
            let raw = format!("/{}", segments.join("/"));
            let env = HashMap::new();
            let once = normalize_endpoint_path(&raw, &env);
            let twice = normalize_endpoint_path(&once, &env);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn equivalent_param_styles_normalize_identically() {
        let env = HashMap::new();
        assert_eq!(
            normalize_endpoint_path("/users/:id", &env),
            normalize_endpoint_path("/users/{id}", &env)
        );
        assert_eq!(
            normalize_endpoint_path("/users/{id}", &env),
            normalize_endpoint_path("/users/[id]", &env)
        );
    }

    #[test]
    fn collapses_repeated_and_trailing_slashes() {
        let env = HashMap::new();
        assert_eq!(normalize_endpoint_path("users//profile/", &env), "/users/profile");
        assert_eq!(normalize_endpoint_path("/", &env), "/");
    }

    #[test]
    fn resolves_env_var_before_param_normalization() {
        let mut env = HashMap::new();
        env.insert("API_BASE".to_string(), "/api/v2".to_string());
        let resolved = resolve_env_vars("${API_BASE}/users/:id", &env);
        assert_eq!(resolved, "/api/v2/users/:id");
    }

    #[test]
    fn endpoint_qn_is_stable_across_equivalent_inputs() {
        let env = HashMap::new();
        let a = endpoint_qn("proj", "csharp", "GET", "users/{id}", &env);
        let b = endpoint_qn("proj", "csharp", "get", "users/:id", &env);
        assert_eq!(a, b);
    }
}
