//! Abstract write boundary for the indexing pipeline.
//!
//! The pipeline never talks to a concrete graph database directly; it
//! drives an `IngestorSink` implementation instead. `async fn` lets a real
//! client do non-blocking writes from the scheduler's worker-process mode
//! without the pipeline itself needing to know it is async.

use crate::error::IngestError;
use crate::graph::{EntityRef, PropertyMap};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait IngestorSink: Send + Sync {
    /// Idempotent upsert of a node keyed by `(label, key, value)`. Properties merge.
    async fn ensure_node(&self, reference: &EntityRef, properties: &PropertyMap) -> Result<(), IngestError>;

    /// Idempotent upsert of an edge keyed by `(source, rel_type, target)`. Properties merge.
    async fn ensure_relationship(
        &self,
        source: &EntityRef,
        rel_type: &str,
        target: &EntityRef,
        properties: Option<&PropertyMap>,
    ) -> Result<(), IngestError>;

    /// Optional read-back, used only by collaborators outside this crate's scope.
    async fn fetch_all(&self, _query: &str, _params: &PropertyMap) -> Result<Vec<Value>, IngestError> {
        Ok(Vec::new())
    }
}

/// In-memory sink used by tests and by any caller that wants to inspect the
/// graph the pipeline produced without standing up a database.
#[derive(Debug, Default)]
pub struct RecordingSink {
    inner: std::sync::Mutex<RecordingSinkState>,
}

#[derive(Debug, Default)]
struct RecordingSinkState {
    nodes: std::collections::HashMap<(String, String, String), PropertyMap>,
    edges: Vec<(EntityRef, String, EntityRef, PropertyMap)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.lock().unwrap().edges.len()
    }

    pub fn has_node(&self, reference: &EntityRef) -> bool {
        let key = (
            reference.label.as_str().to_string(),
            reference.key.clone(),
            reference.value.clone(),
        );
        self.inner.lock().unwrap().nodes.contains_key(&key)
    }

    pub fn has_edge(&self, source: &EntityRef, rel_type: &str, target: &EntityRef) -> bool {
        self.inner
            .lock()
            .unwrap()
            .edges
            .iter()
            .any(|(s, r, t, _)| s == source && r == rel_type && t == target)
    }

    pub fn node_property(&self, reference: &EntityRef, key: &str) -> Option<Value> {
        let map_key = (
            reference.label.as_str().to_string(),
            reference.key.clone(),
            reference.value.clone(),
        );
        self.inner
            .lock()
            .unwrap()
            .nodes
            .get(&map_key)
            .and_then(|p| p.get(key))
            .cloned()
    }
}

#[async_trait]
impl IngestorSink for RecordingSink {
    async fn ensure_node(&self, reference: &EntityRef, properties: &PropertyMap) -> Result<(), IngestError> {
        let key = (
            reference.label.as_str().to_string(),
            reference.key.clone(),
            reference.value.clone(),
        );
        let mut state = self.inner.lock().unwrap();
        state
            .nodes
            .entry(key)
            .or_default()
            .extend(properties.clone());
        Ok(())
    }

    async fn ensure_relationship(
        &self,
        source: &EntityRef,
        rel_type: &str,
        target: &EntityRef,
        properties: Option<&PropertyMap>,
    ) -> Result<(), IngestError> {
        let mut state = self.inner.lock().unwrap();
        let existing = state
            .edges
            .iter_mut()
            .find(|(s, r, t, _)| s == source && r == rel_type && t == target);
        match existing {
            Some((_, _, _, props)) => {
                if let Some(new_props) = properties {
                    props.extend(new_props.clone());
                }
            }
            None => state.edges.push((
                source.clone(),
                rel_type.to_string(),
                target.clone(),
                properties.cloned().unwrap_or_default(),
            )),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Label;

    #[tokio::test]
    async fn ensure_node_is_idempotent() {
        let sink = RecordingSink::new();
        let r = EntityRef::qn(Label::Function, "proj.mod.foo");
        let mut props = PropertyMap::new();
        props.insert("name".into(), "foo".into());
        sink.ensure_node(&r, &props).await.unwrap();
        sink.ensure_node(&r, &props).await.unwrap();
        assert_eq!(sink.node_count(), 1);
    }

    #[tokio::test]
    async fn ensure_relationship_merges_properties() {
        let sink = RecordingSink::new();
        let a = EntityRef::qn(Label::Module, "proj.a");
        let b = EntityRef::qn(Label::Function, "proj.a.foo");
        sink.ensure_relationship(&a, "CONTAINS", &b, None).await.unwrap();
        let mut props = PropertyMap::new();
        props.insert("order".into(), 0.into());
        sink.ensure_relationship(&a, "CONTAINS", &b, Some(&props)).await.unwrap();
        assert_eq!(sink.edge_count(), 1);
        assert!(sink.has_edge(&a, "CONTAINS", &b));
    }
}
