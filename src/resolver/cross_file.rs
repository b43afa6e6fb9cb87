//! Import-graph analytics over what the entity pass already recorded.
//! Emits no edges of its own (`IMPORTS` edges come from the entity pass as
//! imports are parsed); this only summarizes the accumulated mapping without
//! re-deriving it.

use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    /// module -> {alias -> target module}
    edges: HashMap<String, HashMap<String, String>>,
}

impl ImportGraph {
    pub fn record(&mut self, module_qn: &str, alias: &str, target_module: &str) {
        self.edges
            .entry(module_qn.to_string())
            .or_default()
            .insert(alias.to_string(), target_module.to_string());
    }

    pub fn total_modules(&self) -> usize {
        self.edges.len()
    }

    pub fn total_edges(&self) -> usize {
        self.edges.values().map(|m| m.len()).sum()
    }

    /// Folds `other`'s recorded edges into `self`, keeping self's entry on alias collision.
    pub fn merge(&mut self, other: &ImportGraph) {
        for (module, targets) in &other.edges {
            for (alias, target) in targets {
                self.edges.entry(module.clone()).or_default().entry(alias.clone()).or_insert_with(|| target.clone());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossFileSummary {
    pub total_modules: usize,
    pub total_edges: usize,
    /// modules with the most outgoing imports, descending
    pub top_importers: Vec<(String, usize)>,
    /// modules imported by the most distinct modules, descending
    pub top_dependents: Vec<(String, usize)>,
}

fn top_n(mut counted: Vec<(String, usize)>, n: usize) -> Vec<(String, usize)> {
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counted.truncate(n);
    counted
}

pub struct CrossFileResolver;

impl CrossFileResolver {
    pub fn summarize(graph: &ImportGraph, top_n_count: usize) -> CrossFileSummary {
        let importers: Vec<(String, usize)> = graph.edges.iter().map(|(module, targets)| (module.clone(), targets.len())).collect();

        let mut dependent_counts: HashMap<String, usize> = HashMap::new();
        for targets in graph.edges.values() {
            for target in targets.values() {
                *dependent_counts.entry(target.clone()).or_insert(0) += 1;
            }
        }
        let dependents: Vec<(String, usize)> = dependent_counts.into_iter().collect();

        CrossFileSummary {
            total_modules: graph.total_modules(),
            total_edges: graph.total_edges(),
            top_importers: top_n(importers, top_n_count),
            top_dependents: top_n(dependents, top_n_count),
        }
    }

    pub fn log_summary(summary: &CrossFileSummary) {
        info!(
            total_modules = summary.total_modules,
            total_edges = summary.total_edges,
            top_importers = ?summary.top_importers,
            top_dependents = ?summary.top_dependents,
            "cross-file import summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_top_importers_and_dependents() {
        let mut graph = ImportGraph::default();
        graph.record("proj.a", "os", "stdlib.os");
        graph.record("proj.a", "sys", "stdlib.sys");
        graph.record("proj.b", "os", "stdlib.os");

        let summary = CrossFileResolver::summarize(&graph, 1);
        assert_eq!(summary.total_modules, 2);
        assert_eq!(summary.total_edges, 3);
        assert_eq!(summary.top_importers[0].0, "proj.a");
        assert_eq!(summary.top_dependents[0], ("stdlib.os".to_string(), 2));
    }

    #[test]
    fn empty_graph_summarizes_to_zero() {
        let graph = ImportGraph::default();
        let summary = CrossFileResolver::summarize(&graph, 5);
        assert_eq!(summary.total_modules, 0);
        assert_eq!(summary.total_edges, 0);
        assert!(summary.top_importers.is_empty());
    }

    #[test]
    fn merge_folds_in_edges_from_another_graph() {
        let mut a = ImportGraph::default();
        a.record("proj.a", "os", "stdlib.os");
        let mut b = ImportGraph::default();
        b.record("proj.b", "sys", "stdlib.sys");

        a.merge(&b);
        assert_eq!(a.total_modules(), 2);
        assert_eq!(a.total_edges(), 2);
    }
}
