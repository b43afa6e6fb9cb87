//! Lightweight regex-only scan producing a `symbol -> {module}` index before
//! any tree-sitter parsing happens.
//!
//! Deliberately shallow: it only looks at top-level definitions and accepts
//! false positives in exchange for never missing a real top-level name.

use ignore::WalkBuilder;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    CSharp,
    Php,
    Rust,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "go" => Some(Language::Go),
            "cs" => Some(Language::CSharp),
            "php" => Some(Language::Php),
            "rs" => Some(Language::Rust),
            _ => None,
        }
    }
}

fn patterns_for(language: Language) -> &'static [Regex] {
    macro_rules! cell_for {
        ($name:ident, $patterns:expr) => {{
            static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
            CELL.get_or_init(|| $patterns.iter().map(|p| Regex::new(p).unwrap()).collect())
        }};
    }
    match language {
        Language::Python => cell_for!(
            PY,
            [r"(?m)^(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)", r"(?m)^class\s+([A-Za-z_][A-Za-z0-9_]*)"]
        ),
        Language::JavaScript | Language::TypeScript => cell_for!(
            JS,
            [
                r"(?m)^export\s+(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)",
                r"(?m)^export\s+(?:default\s+)?class\s+([A-Za-z_$][A-Za-z0-9_$]*)",
                r"(?m)^export\s+(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
                r"(?m)^export\s+interface\s+([A-Za-z_$][A-Za-z0-9_$]*)",
                r"(?m)^export\s+type\s+([A-Za-z_$][A-Za-z0-9_$]*)",
                r"(?m)^export\s+enum\s+([A-Za-z_$][A-Za-z0-9_$]*)",
            ]
        ),
        Language::Go => cell_for!(
            GO,
            [
                r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)^type\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)^(?:var|const)\s+([A-Za-z_][A-Za-z0-9_]*)",
            ]
        ),
        Language::CSharp => cell_for!(
            CS,
            [
                r"(?m)\b(?:class|interface|struct|record|enum)\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)\bpublic\s+(?:static\s+|virtual\s+|override\s+|async\s+)*[\w<>\[\],\s]+\s+([A-Za-z_][A-Za-z0-9_]*)\s*\("
            ]
        ),
        Language::Php => cell_for!(
            PHP,
            [
                r"(?m)\bfunction\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)\bclass\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)\binterface\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)\btrait\s+([A-Za-z_][A-Za-z0-9_]*)",
            ]
        ),
        Language::Rust => cell_for!(
            RS,
            [
                r"(?m)^(?:pub\s+)?(?:async\s+)?fn\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)^(?:pub\s+)?struct\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)^(?:pub\s+)?enum\s+([A-Za-z_][A-Za-z0-9_]*)",
                r"(?m)^(?:pub\s+)?trait\s+([A-Za-z_][A-Za-z0-9_]*)",
            ]
        ),
    }
}

#[derive(Debug, Default, Clone)]
pub struct PreScanIndex {
    pub symbol_to_modules: HashMap<String, HashSet<String>>,
    pub module_to_symbols: HashMap<String, HashSet<String>>,
}

impl PreScanIndex {
    pub fn modules_defining(&self, symbol: &str) -> Option<&HashSet<String>> {
        self.symbol_to_modules.get(symbol)
    }

    fn record(&mut self, symbol: &str, module_qn: &str) {
        self.symbol_to_modules
            .entry(symbol.to_string())
            .or_default()
            .insert(module_qn.to_string());
        self.module_to_symbols
            .entry(module_qn.to_string())
            .or_default()
            .insert(symbol.to_string());
    }
}

/// A source file turned up by [`PreScanner::discover_files`], before the
/// entity pass has assigned it a qualified module name.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: String,
    pub language: Language,
    pub source: String,
}

pub struct PreScanner;

impl PreScanner {
    /// Scans `source` (already read as UTF-8, lossy on error upstream) and
    /// records every top-level symbol it finds under `module_qn`.
    pub fn scan_into(index: &mut PreScanIndex, module_qn: &str, language: Language, source: &str) {
        for pattern in patterns_for(language) {
            for caps in pattern.captures_iter(source) {
                if let Some(name) = caps.get(1) {
                    index.record(name.as_str(), module_qn);
                }
            }
        }
    }

    pub fn scan(module_qn: &str, language: Language, source: &str) -> PreScanIndex {
        let mut index = PreScanIndex::default();
        Self::scan_into(&mut index, module_qn, language, source);
        index
    }

    /// Walks `root` respecting `.gitignore`/`.ignore`/VCS-ignore rules,
    /// skipping hidden directories and anything excluded, and reads every
    /// file whose extension maps to a supported [`Language`].
    ///
    /// Read errors (permissions, broken symlinks, non-UTF-8 content) drop
    /// the offending file rather than failing the whole walk; a repo-wide
    /// scan should survive a handful of unreadable files.
    pub fn discover_files(root: &Path) -> Vec<DiscoveredFile> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(root).hidden(true).git_ignore(true).git_exclude(true).build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else { continue };
            let Some(language) = Language::from_extension(ext) else { continue };
            let Ok(source) = std::fs::read_to_string(path) else { continue };
            files.push(DiscoveredFile { path: path.to_string_lossy().into_owned(), language, source });
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_python_top_level_defs() {
        let src = "def foo():\n    pass\n\nclass Bar:\n    def method(self):\n        pass\n";
        let index = PreScanner::scan("proj.mod", Language::Python, src);
        assert!(index.modules_defining("foo").unwrap().contains("proj.mod"));
        assert!(index.modules_defining("Bar").unwrap().contains("proj.mod"));
        assert!(index.modules_defining("method").is_none());
    }

    #[test]
    fn finds_js_exports() {
        let src = "export function handler() {}\nexport class Widget {}\nexport const PI = 3;\n";
        let index = PreScanner::scan("proj.mod", Language::JavaScript, src);
        assert!(index.modules_defining("handler").is_some());
        assert!(index.modules_defining("Widget").is_some());
        assert!(index.modules_defining("PI").is_some());
    }

    #[test]
    fn accumulates_across_files_into_same_index() {
        let mut index = PreScanIndex::default();
        PreScanner::scan_into(&mut index, "proj.a", Language::Go, "func Foo() {}\n");
        PreScanner::scan_into(&mut index, "proj.b", Language::Go, "func Foo() {}\n");
        assert_eq!(index.modules_defining("Foo").unwrap().len(), 2);
    }

    #[test]
    fn discover_files_skips_gitignored_and_unsupported_extensions() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir()
            .join(format!("prescan-discover-{}-{}", std::process::id(), COUNTER.fetch_add(1, Ordering::SeqCst)));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(".gitignore"), "ignored.py\n").unwrap();
        std::fs::write(dir.join("ignored.py"), "def skip(): pass\n").unwrap();
        std::fs::write(dir.join("kept.py"), "def keep(): pass\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "not code\n").unwrap();

        let files = PreScanner::discover_files(&dir);
        assert!(files.iter().any(|f| f.path.ends_with("kept.py")));
        assert!(!files.iter().any(|f| f.path.ends_with("ignored.py")));
        assert!(!files.iter().any(|f| f.path.ends_with("notes.txt")));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
