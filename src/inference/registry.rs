//! Per-language builtin type tables consulted as the last resort of the
//! inference strategy chain.

use crate::prescan::Language;
use std::collections::HashSet;
use std::sync::OnceLock;

pub struct TypeRegistry;

fn builtins_for(language: Language) -> &'static HashSet<&'static str> {
    macro_rules! set_for {
        ($cell:ident, $items:expr) => {{
            static CELL: OnceLock<HashSet<&'static str>> = OnceLock::new();
            CELL.get_or_init(|| $items.into_iter().collect())
        }};
    }
    match language {
        Language::Python => set_for!(
            PY,
            ["int", "str", "float", "bool", "list", "dict", "set", "tuple", "bytes", "None"]
        ),
        Language::JavaScript | Language::TypeScript => set_for!(
            JS,
            ["number", "string", "boolean", "any", "unknown", "void", "object", "undefined", "null"]
        ),
        Language::Go => set_for!(
            GO,
            ["int", "string", "bool", "float64", "byte", "rune", "error", "interface{}"]
        ),
        Language::CSharp => set_for!(
            CS,
            ["int", "string", "bool", "double", "float", "object", "var", "decimal"]
        ),
        Language::Php => set_for!(PHP, ["int", "string", "bool", "float", "array", "mixed", "void"]),
        Language::Rust => set_for!(
            RS,
            ["i32", "i64", "u32", "u64", "usize", "f64", "bool", "String", "str", "Vec", "Option"]
        ),
    }
}

impl TypeRegistry {
    pub fn is_builtin(language: Language, name: &str) -> bool {
        builtins_for(language).contains(name)
    }

    pub fn lookup(language: Language, name: &str) -> Option<&'static str> {
        builtins_for(language).get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_python_builtins() {
        assert!(TypeRegistry::is_builtin(Language::Python, "dict"));
        assert!(!TypeRegistry::is_builtin(Language::Python, "Widget"));
    }
}
