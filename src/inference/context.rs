//! Ambient state threaded through type inference: scope stack, known
//! variables/functions, and import resolution.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub qn: String,
    pub variables: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct InferenceContext {
    stack: Vec<Scope>,
    /// function QN -> declared/inferred return type
    pub function_return_types: HashMap<String, String>,
    /// alias -> fully-qualified module path
    import_aliases: HashMap<String, String>,
    /// module -> names imported `from` it
    from_imports: HashMap<String, Vec<String>>,
    memo: HashMap<String, String>,
}

impl InferenceContext {
    pub fn enter_scope(&mut self, kind: ScopeKind, qn: &str) {
        self.stack.push(Scope {
            kind,
            qn: qn.to_string(),
            variables: HashMap::new(),
        });
    }

    pub fn exit_scope(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    pub fn current_scope(&self) -> Option<&Scope> {
        self.stack.last()
    }

    pub fn bind_variable(&mut self, name: &str, type_string: &str) {
        if let Some(scope) = self.stack.last_mut() {
            scope.variables.insert(name.to_string(), type_string.to_string());
        }
    }

    /// Walks the scope stack innermost-first looking for a known variable type.
    pub fn lookup_variable(&self, name: &str) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
            .map(|s| s.as_str())
    }

    pub fn record_import_alias(&mut self, alias: &str, module_path: &str) {
        self.import_aliases.insert(alias.to_string(), module_path.to_string());
    }

    pub fn record_from_import(&mut self, module_path: &str, name: &str) {
        self.from_imports
            .entry(module_path.to_string())
            .or_default()
            .push(name.to_string());
    }

    /// Resolves `name` against recorded imports to a dotted module path, if any.
    pub fn resolve_import(&self, name: &str) -> Option<&str> {
        if let Some(path) = self.import_aliases.get(name) {
            return Some(path.as_str());
        }
        self.from_imports
            .iter()
            .find(|(_, names)| names.iter().any(|n| n == name))
            .map(|(module, _)| module.as_str())
    }

    pub fn memoize(&mut self, key: &str, type_string: &str) {
        self.memo.insert(key.to_string(), type_string.to_string());
    }

    pub fn memoized(&self, key: &str) -> Option<&str> {
        self.memo.get(key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_lookup_respects_innermost_scope() {
        let mut ctx = InferenceContext::default();
        ctx.enter_scope(ScopeKind::Module, "proj.mod");
        ctx.bind_variable("x", "int");
        ctx.enter_scope(ScopeKind::Function, "proj.mod.f");
        ctx.bind_variable("x", "str");
        assert_eq!(ctx.lookup_variable("x"), Some("str"));
        ctx.exit_scope();
        assert_eq!(ctx.lookup_variable("x"), Some("int"));
    }

    #[test]
    fn resolve_import_checks_aliases_then_from_imports() {
        let mut ctx = InferenceContext::default();
        ctx.record_import_alias("np", "numpy");
        ctx.record_from_import("os.path", "join");
        assert_eq!(ctx.resolve_import("np"), Some("numpy"));
        assert_eq!(ctx.resolve_import("join"), Some("os.path"));
        assert_eq!(ctx.resolve_import("missing"), None);
    }
}
