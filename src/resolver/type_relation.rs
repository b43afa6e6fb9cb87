//! Attaches `RETURNS_TYPE` / `PARAMETER_TYPE` edges from inference results,
//! creating placeholder `Type` nodes for names that never resolve to a
//! declared class.

use crate::entity::EntityRegistry;
use crate::graph::{EdgeIngest, EntityRef, Label, NodeIngest, RelationType};
use crate::inference::{TypeInferenceResult, TypeSource};
use crate::prescan::Language;

/// One parameter or return-type site discovered during extraction, paired
/// with the inference result already computed for it.
#[derive(Debug, Clone)]
pub struct TypedSite {
    pub owner_qn: String,
    pub owner_label: Label,
    pub is_return: bool,
    pub parameter_index: Option<usize>,
    pub inference: TypeInferenceResult,
}

fn type_qn(project: &str, type_name: &str) -> String {
    format!("{}.type.{}", project, type_name)
}

/// A `Type` node is a placeholder unless the registry already has a
/// `Class`/`Interface` entry at that QN under the project namespace.
fn type_node(registry: &EntityRegistry, project: &str, type_name: &str) -> NodeIngest {
    let qn = type_qn(project, type_name);
    let declared_qn = format!("{}.{}", project, type_name);
    let node = NodeIngest::new(Label::Type, qn).with("name", type_name);
    if registry.contains(&declared_qn) {
        node
    } else {
        node.placeholder()
    }
}

pub struct TypeRelationOutput {
    pub nodes: Vec<NodeIngest>,
    pub edges: Vec<EdgeIngest>,
}

pub fn link_typed_sites(registry: &EntityRegistry, project: &str, sites: &[TypedSite]) -> TypeRelationOutput {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for site in sites {
        if site.inference.source == TypeSource::Builtin && site.inference.confidence == 0.0 {
            continue;
        }
        let node = type_node(registry, project, &site.inference.type_string);
        let target = EntityRef::qn(Label::Type, node.qualified_name().unwrap().to_string());
        nodes.push(node);

        let rel = if site.is_return { RelationType::ReturnsType } else { RelationType::ParameterType };
        let mut edge = EdgeIngest::new(EntityRef::qn(site.owner_label, site.owner_qn.clone()), rel, target)
            .with("confidence", site.inference.confidence as f64);
        if let Some(idx) = site.parameter_index {
            edge = edge.with("parameter_index", idx as i64);
        }
        edges.push(edge);
    }

    TypeRelationOutput { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::TypeSource;

    fn site(owner: &str, is_return: bool, type_string: &str) -> TypedSite {
        TypedSite {
            owner_qn: owner.to_string(),
            owner_label: Label::Function,
            is_return,
            parameter_index: if is_return { None } else { Some(0) },
            inference: TypeInferenceResult {
                type_string: type_string.to_string(),
                confidence: 0.9,
                source: TypeSource::Inference,
                language: Language::Python,
                context: Some(owner.to_string()),
            },
        }
    }

    #[test]
    fn emits_placeholder_type_for_unknown_class() {
        let registry = EntityRegistry::default();
        let output = link_typed_sites(&registry, "proj", &[site("proj.mod.f", true, "Widget")]);
        assert_eq!(output.nodes.len(), 1);
        assert_eq!(output.nodes[0].properties.get("is_placeholder").and_then(|v| v.as_bool()), Some(true));
        assert_eq!(output.edges[0].rel_type, RelationType::ReturnsType);
    }

    #[test]
    fn does_not_placeholder_a_declared_class() {
        let mut registry = EntityRegistry::default();
        registry.insert_entity("proj.Widget", Label::Class);
        let output = link_typed_sites(&registry, "proj", &[site("proj.mod.f", true, "Widget")]);
        assert_eq!(output.nodes[0].properties.get("is_placeholder"), None);
    }

    #[test]
    fn skips_sites_that_degraded_to_any() {
        let registry = EntityRegistry::default();
        let mut s = site("proj.mod.f", false, "Any");
        s.inference.confidence = 0.0;
        s.inference.source = TypeSource::Builtin;
        let output = link_typed_sites(&registry, "proj", &[s]);
        assert!(output.nodes.is_empty());
        assert!(output.edges.is_empty());
    }
}
