//! Qualified-name registry populated by the entity extractor and consumed
//! by every resolver pass.
//!
//! `find_ending_with` answers "which QNs end in this simple name", the
//! lookup resolvers need to bind an unqualified call or type reference.

use crate::graph::Label;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// QN -> label, ordered so prefix scans are contiguous.
    function_registry: BTreeMap<String, Label>,
    simple_name_lookup: HashMap<String, HashSet<String>>,
    module_qn_to_file_path: HashMap<String, PathBuf>,
    file_path_to_module_qn: HashMap<PathBuf, String>,
}

fn simple_name_of(qn: &str) -> &str {
    qn.rsplit('.').next().unwrap_or(qn)
}

impl EntityRegistry {
    pub fn insert_entity(&mut self, qn: &str, label: Label) {
        self.function_registry.insert(qn.to_string(), label);
        self.simple_name_lookup
            .entry(simple_name_of(qn).to_string())
            .or_default()
            .insert(qn.to_string());
    }

    pub fn register_module(&mut self, module_qn: &str, file_path: &Path) {
        self.module_qn_to_file_path
            .insert(module_qn.to_string(), file_path.to_path_buf());
        self.file_path_to_module_qn
            .insert(file_path.to_path_buf(), module_qn.to_string());
        self.insert_entity(module_qn, Label::Module);
    }

    pub fn label_of(&self, qn: &str) -> Option<Label> {
        self.function_registry.get(qn).copied()
    }

    pub fn contains(&self, qn: &str) -> bool {
        self.function_registry.contains_key(qn)
    }

    /// QNs ending in `.{simple_name}` (or exactly equal to it, for top-level names).
    pub fn find_ending_with(&self, simple_name: &str) -> Vec<&str> {
        self.simple_name_lookup
            .get(simple_name)
            .map(|set| set.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    /// Among candidates ending in `simple_name`, prefer the one whose QN starts
    /// with `receiver_qn_prefix` (binding `controller.method` to the method
    /// under the right class).
    pub fn find_best_match(&self, simple_name: &str, receiver_qn_prefix: Option<&str>) -> Option<&str> {
        let candidates = self.find_ending_with(simple_name);
        if candidates.is_empty() {
            return None;
        }
        if let Some(prefix) = receiver_qn_prefix {
            if let Some(hit) = candidates.iter().find(|qn| qn.starts_with(prefix)) {
                return Some(hit);
            }
        }
        candidates.into_iter().next()
    }

    pub fn module_qn_for_path(&self, path: &Path) -> Option<&str> {
        self.file_path_to_module_qn.get(path).map(|s| s.as_str())
    }

    pub fn file_path_for_module_qn(&self, module_qn: &str) -> Option<&Path> {
        self.module_qn_to_file_path.get(module_qn).map(|p| p.as_path())
    }

    pub fn entity_count(&self) -> usize {
        self.function_registry.len()
    }

    pub fn all_qns(&self) -> impl Iterator<Item = &str> {
        self.function_registry.keys().map(|s| s.as_str())
    }
}
