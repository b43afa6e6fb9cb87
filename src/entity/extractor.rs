//! Converts a tree-sitter AST into entity ingests, and populates the
//! `EntityRegistry`.
//!
//! Assumptions about field names are per-language and documented inline;
//! none of them reach past what each grammar guarantees. Containment
//! (modules/classes/functions/methods) is produced by a direct recursive
//! walk; call/import/decorator/throw/catch sites are produced separately by
//! `entity::relations::extract_relations`, which runs the named queries
//! under `queries/` against the same tree and needs the byte-range
//! `ScopeEntry` list this walk also builds to attribute a site to its
//! enclosing function, method, or module.

use crate::entity::registry::EntityRegistry;
use crate::graph::{join_qn, EdgeIngest, EntityRef, Label, NodeIngest, RelationType};
use crate::inference::TypeInferenceEngine;
use crate::prescan::Language;
use crate::resolver::TypedSite;
use std::ops::Range;
use tree_sitter::{Node, Tree};

struct LangShape {
    function_kinds: &'static [&'static str],
    class_kinds: &'static [&'static str],
    interface_kinds: &'static [&'static str],
    method_kinds: &'static [&'static str],
    container_kinds: &'static [&'static str],
    name_field: &'static str,
    /// Field carrying the declared return-type annotation, or `""` when the
    /// language/grammar has no such field.
    return_type_field: &'static str,
}

fn shape_for(language: Language) -> LangShape {
    match language {
        Language::Python => LangShape {
            function_kinds: &["function_definition"],
            class_kinds: &["class_definition"],
            interface_kinds: &[],
            method_kinds: &[],
            container_kinds: &["class_definition"],
            name_field: "name",
            return_type_field: "return_type",
        },
        Language::JavaScript | Language::TypeScript => LangShape {
            function_kinds: &["function_declaration", "function_signature"],
            class_kinds: &["class_declaration"],
            interface_kinds: &["interface_declaration"],
            method_kinds: &["method_definition"],
            container_kinds: &["class_declaration", "interface_declaration"],
            name_field: "name",
            return_type_field: "return_type",
        },
        Language::Go => LangShape {
            function_kinds: &["function_declaration"],
            class_kinds: &["type_declaration"],
            interface_kinds: &[],
            method_kinds: &["method_declaration"],
            container_kinds: &[],
            name_field: "name",
            return_type_field: "result",
        },
        Language::CSharp => LangShape {
            function_kinds: &[],
            class_kinds: &["class_declaration", "struct_declaration", "record_declaration"],
            interface_kinds: &["interface_declaration"],
            method_kinds: &["method_declaration"],
            container_kinds: &["class_declaration", "struct_declaration", "record_declaration", "interface_declaration"],
            name_field: "name",
            return_type_field: "type",
        },
        Language::Php => LangShape {
            function_kinds: &["function_definition"],
            class_kinds: &["class_declaration"],
            interface_kinds: &["interface_declaration"],
            method_kinds: &["method_declaration"],
            container_kinds: &["class_declaration", "interface_declaration"],
            name_field: "name",
            return_type_field: "return_type",
        },
        Language::Rust => LangShape {
            function_kinds: &["function_item"],
            class_kinds: &["struct_item", "enum_item"],
            interface_kinds: &["trait_item"],
            method_kinds: &[],
            container_kinds: &["impl_item", "trait_item"],
            name_field: "name",
            return_type_field: "return_type",
        },
    }
}

/// A byte-range-addressed entity produced during the containment walk,
/// reused by the relation pass to attribute a call/throw/decorator site to
/// its enclosing function, method, class, or (by default) module.
#[derive(Debug, Clone)]
pub struct ScopeEntry {
    pub range: Range<usize>,
    pub qn: String,
    pub label: Label,
}

pub struct ExtractedModule {
    pub nodes: Vec<NodeIngest>,
    pub edges: Vec<EdgeIngest>,
    pub typed_sites: Vec<TypedSite>,
    pub scopes: Vec<ScopeEntry>,
}

fn identifiers_in(node: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if matches!(
            child.kind(),
            "identifier" | "type_identifier" | "qualified_name" | "name" | "generic_name" | "scoped_identifier"
        ) {
            out.push(child);
        }
    }
    out
}

struct Extractor<'a> {
    shape: LangShape,
    language: Language,
    source: &'a str,
    project: &'a str,
    module_qn: &'a str,
    nodes: Vec<NodeIngest>,
    edges: Vec<EdgeIngest>,
    typed_sites: Vec<TypedSite>,
    scopes: Vec<ScopeEntry>,
}

impl<'a> Extractor<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn name_of(&self, node: Node) -> Option<&'a str> {
        node.child_by_field_name(self.shape.name_field)
            .map(|n| self.text(n))
    }

    fn is_function(&self, kind: &str) -> bool {
        self.shape.function_kinds.contains(&kind)
    }
    fn is_class(&self, kind: &str) -> bool {
        self.shape.class_kinds.contains(&kind)
    }
    fn is_interface(&self, kind: &str) -> bool {
        self.shape.interface_kinds.contains(&kind)
    }
    fn is_method(&self, kind: &str) -> bool {
        self.shape.method_kinds.contains(&kind)
    }
    fn is_container(&self, kind: &str) -> bool {
        self.shape.container_kinds.contains(&kind) || self.is_class(kind) || self.is_interface(kind)
    }

    /// Base-class/interface edges read straight off the class/interface
    /// node; targets are qualified against the current module since
    /// same-file inheritance is by far the common case and cross-file bases
    /// have no resolver pass of their own yet.
    fn inheritance_edges(&self, node: Node<'a>, qn: &str) -> Vec<EdgeIngest> {
        let mut edges = Vec::new();
        let class_ref = EntityRef::qn(Label::Class, qn.to_string());
        match self.language {
            Language::Python => {
                if let Some(bases) = node.child_by_field_name("superclasses") {
                    for base in identifiers_in(bases) {
                        let name = self.text(base);
                        edges.push(EdgeIngest::new(
                            class_ref.clone(),
                            RelationType::Inherits,
                            EntityRef::qn(Label::Class, join_qn(&[self.module_qn, name])),
                        ));
                    }
                }
            }
            Language::Rust => {
                if let Some(trait_node) = node.child_by_field_name("trait") {
                    let name = self.text(trait_node);
                    edges.push(EdgeIngest::new(
                        class_ref,
                        RelationType::Implements,
                        EntityRef::qn(Label::Interface, join_qn(&[self.module_qn, name])),
                    ));
                }
            }
            Language::JavaScript | Language::TypeScript => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() != "class_heritage" {
                        continue;
                    }
                    let mut hcursor = child.walk();
                    for heritage in child.children(&mut hcursor) {
                        match heritage.kind() {
                            "extends_clause" => {
                                if let Some(target) = identifiers_in(heritage).into_iter().next() {
                                    edges.push(EdgeIngest::new(
                                        class_ref.clone(),
                                        RelationType::Inherits,
                                        EntityRef::qn(Label::Class, join_qn(&[self.module_qn, self.text(target)])),
                                    ));
                                }
                            }
                            "implements_clause" => {
                                for target in identifiers_in(heritage) {
                                    edges.push(EdgeIngest::new(
                                        class_ref.clone(),
                                        RelationType::Implements,
                                        EntityRef::qn(Label::Interface, join_qn(&[self.module_qn, self.text(target)])),
                                    ));
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
            Language::CSharp => {
                if let Some(bases) = node.child_by_field_name("bases") {
                    for (idx, base) in identifiers_in(bases).into_iter().enumerate() {
                        let name = self.text(base);
                        if idx == 0 {
                            edges.push(EdgeIngest::new(
                                class_ref.clone(),
                                RelationType::Inherits,
                                EntityRef::qn(Label::Class, join_qn(&[self.module_qn, name])),
                            ));
                        } else {
                            edges.push(EdgeIngest::new(
                                class_ref.clone(),
                                RelationType::Implements,
                                EntityRef::qn(Label::Interface, join_qn(&[self.module_qn, name])),
                            ));
                        }
                    }
                }
            }
            Language::Php => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "base_clause" => {
                            for base in identifiers_in(child) {
                                edges.push(EdgeIngest::new(
                                    class_ref.clone(),
                                    RelationType::Inherits,
                                    EntityRef::qn(Label::Class, join_qn(&[self.module_qn, self.text(base)])),
                                ));
                            }
                        }
                        "class_interface_clause" => {
                            for iface in identifiers_in(child) {
                                edges.push(EdgeIngest::new(
                                    class_ref.clone(),
                                    RelationType::Implements,
                                    EntityRef::qn(Label::Interface, join_qn(&[self.module_qn, self.text(iface)])),
                                ));
                            }
                        }
                        _ => {}
                    }
                }
            }
            Language::Go => {}
        }
        edges
    }

    fn return_typed_site(&self, node: Node<'a>, qn: &str, label: Label) -> Option<TypedSite> {
        if self.shape.return_type_field.is_empty() {
            return None;
        }
        let annotation = self.text(node.child_by_field_name(self.shape.return_type_field)?);
        let inference = TypeInferenceEngine::infer_annotated(self.language, Some(annotation), Some(qn))?;
        Some(TypedSite {
            owner_qn: qn.to_string(),
            owner_label: label,
            is_return: true,
            parameter_index: None,
            inference,
        })
    }

    fn emit(&mut self, label: Label, qn: &str, name: &str, container_qn: &str, rel: RelationType, node: Node<'a>) {
        self.nodes.push(NodeIngest::new(label, qn).with("name", name));
        self.edges.push(EdgeIngest::new(
            EntityRef::qn(self.parent_label(container_qn), container_qn),
            rel,
            EntityRef::qn(label, qn),
        ));

        match label {
            Label::Function | Label::Method => {
                self.scopes.push(ScopeEntry { range: node.byte_range(), qn: qn.to_string(), label });
                if let Some(site) = self.return_typed_site(node, qn, label) {
                    self.typed_sites.push(site);
                }
            }
            Label::Class | Label::Interface => {
                self.scopes.push(ScopeEntry { range: node.byte_range(), qn: qn.to_string(), label });
                let inherited = self.inheritance_edges(node, qn);
                self.edges.extend(inherited);
            }
            _ => {}
        }
    }

    fn parent_label(&self, qn: &str) -> Label {
        if qn == self.module_qn {
            Label::Module
        } else {
            Label::Class
        }
    }

    fn walk(&mut self, node: Node<'a>, container_qn: &str, in_container: bool) {
        let kind = node.kind();

        // Go methods carry their receiver type on the node itself rather
        // than being nested inside a class-like container.
        if kind == "method_declaration" && node.child_by_field_name("receiver").is_some() {
            if let (Some(name), Some(receiver)) = (
                self.name_of(node),
                node.child_by_field_name("receiver").map(|n| self.text(n)),
            ) {
                let receiver_type = receiver
                    .trim_matches(|c: char| c == '(' || c == ')' || c == '*')
                    .split_whitespace()
                    .last()
                    .unwrap_or(receiver)
                    .trim_start_matches('*');
                let owner_qn = join_qn(&[container_qn, receiver_type]);
                let qn = join_qn(&[&owner_qn, name]);
                self.emit(Label::Method, &qn, name, &owner_qn, RelationType::Contains, node);
                self.walk_children(node, &qn, false);
                return;
            }
        }

        if self.is_function(kind) || (in_container && self.is_method(kind)) {
            if let Some(name) = self.name_of(node) {
                let qn = join_qn(&[container_qn, name]);
                let label = if in_container { Label::Method } else { Label::Function };
                self.emit(label, &qn, name, container_qn, RelationType::Contains, node);
                self.walk_children(node, &qn, false);
                return;
            }
        }

        // Go's type_declaration wraps one or more type_spec children; the
        // name lives on the spec, not the declaration.
        if kind == "type_declaration" {
            let mut cursor = node.walk();
            for spec in node.children(&mut cursor) {
                if spec.kind() == "type_spec" {
                    if let Some(name) = self.name_of(spec) {
                        let qn = join_qn(&[container_qn, name]);
                        self.emit(Label::Class, &qn, name, container_qn, RelationType::Contains, spec);
                    }
                }
            }
            return;
        }

        if self.is_class(kind) {
            if let Some(name) = self.name_of(node) {
                let qn = join_qn(&[container_qn, name]);
                self.emit(Label::Class, &qn, name, container_qn, RelationType::Contains, node);
                self.walk_children(node, &qn, true);
                return;
            }
        }

        if self.is_interface(kind) {
            if let Some(name) = self.name_of(node) {
                let qn = join_qn(&[container_qn, name]);
                self.emit(Label::Interface, &qn, name, container_qn, RelationType::Contains, node);
                self.walk_children(node, &qn, true);
                return;
            }
        }

        // impl_item / trait_item (Rust): no own node, but becomes the
        // container for the methods nested inside it.
        if self.is_container(kind) && !self.is_class(kind) && !self.is_interface(kind) {
            let target = node
                .child_by_field_name("type")
                .or_else(|| node.child_by_field_name(self.shape.name_field))
                .map(|n| self.text(n))
                .unwrap_or(container_qn);
            let impl_qn = if target == container_qn {
                container_qn.to_string()
            } else {
                join_qn(&[container_qn, target])
            };
            if kind == "impl_item" {
                let inherited = self.inheritance_edges(node, &impl_qn);
                self.edges.extend(inherited);
            }
            self.walk_children(node, &impl_qn, true);
            return;
        }

        self.walk_children(node, container_qn, in_container);
    }

    fn walk_children(&mut self, node: Node<'a>, container_qn: &str, in_container: bool) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, container_qn, in_container);
        }
    }
}

/// Extracts all entities from `tree`/`source` for the module named `module_qn`
/// and records everything in `registry`.
pub fn extract_module(
    registry: &mut EntityRegistry,
    project: &str,
    module_qn: &str,
    language: Language,
    tree: &Tree,
    source: &str,
) -> ExtractedModule {
    let mut extractor = Extractor {
        shape: shape_for(language),
        language,
        source,
        project,
        module_qn,
        nodes: vec![NodeIngest::new(Label::Module, module_qn)],
        edges: Vec::new(),
        typed_sites: Vec::new(),
        scopes: vec![ScopeEntry { range: 0..source.len(), qn: module_qn.to_string(), label: Label::Module }],
    };
    extractor.walk_children(tree.root_node(), module_qn, false);

    for node in &extractor.nodes {
        if let Some(qn) = node.qualified_name() {
            registry.insert_entity(qn, node.label);
        }
    }

    ExtractedModule {
        nodes: extractor.nodes,
        edges: extractor.edges,
        typed_sites: extractor.typed_sites,
        scopes: extractor.scopes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserDriver;

    fn parse(language: Language, source: &str) -> (std::sync::Arc<Tree>, std::sync::Arc<String>) {
        let driver = ParserDriver::new(4, None);
        driver.parse("test", language, source.to_string()).unwrap()
    }

    #[test]
    fn extracts_python_class_and_methods() {
        let src = "class Foo:\n    def bar(self):\n        pass\n\ndef top():\n    pass\n";
        let (tree, source) = parse(Language::Python, src);
        let mut registry = EntityRegistry::default();
        let extracted = extract_module(&mut registry, "proj", "proj.mod", Language::Python, &tree, &source);

        assert!(registry.contains("proj.mod.Foo"));
        assert!(registry.contains("proj.mod.Foo.bar"));
        assert!(registry.contains("proj.mod.top"));
        assert_eq!(registry.label_of("proj.mod.Foo.bar"), Some(Label::Method));
        assert_eq!(registry.label_of("proj.mod.top"), Some(Label::Function));
        assert!(extracted
            .edges
            .iter()
            .any(|e| e.source.value == "proj.mod" && e.target.value == "proj.mod.Foo"));
    }

    #[test]
    fn extracts_rust_impl_methods_under_struct_qn() {
        let src = "struct Widget;\nimpl Widget {\n    fn render(&self) {}\n}\n";
        let (tree, source) = parse(Language::Rust, src);
        let mut registry = EntityRegistry::default();
        extract_module(&mut registry, "proj", "proj.widget", Language::Rust, &tree, &source);

        assert!(registry.contains("proj.widget.Widget"));
        assert!(registry.contains("proj.widget.Widget.render"));
    }

    #[test]
    fn error_tolerant_go_extraction_still_finds_valid_sibling() {
        let src = "func broken( {\nfunc Valid() {}\n";
        let (tree, source) = parse(Language::Go, src);
        let mut registry = EntityRegistry::default();
        extract_module(&mut registry, "proj", "proj.pkg", Language::Go, &tree, &source);
        assert!(registry.contains("proj.pkg.Valid"));
    }

    #[test]
    fn python_subclass_produces_inherits_edge() {
        let src = "class Base:\n    pass\n\nclass Child(Base):\n    pass\n";
        let (tree, source) = parse(Language::Python, src);
        let mut registry = EntityRegistry::default();
        let extracted = extract_module(&mut registry, "proj", "proj.mod", Language::Python, &tree, &source);

        assert!(extracted.edges.iter().any(|e| {
            e.rel_type == RelationType::Inherits && e.source.value == "proj.mod.Child" && e.target.value == "proj.mod.Base"
        }));
    }

    #[test]
    fn python_annotated_return_type_produces_typed_site() {
        let src = "def greet() -> str:\n    return 'hi'\n";
        let (tree, source) = parse(Language::Python, src);
        let mut registry = EntityRegistry::default();
        let extracted = extract_module(&mut registry, "proj", "proj.mod", Language::Python, &tree, &source);

        assert_eq!(extracted.typed_sites.len(), 1);
        assert_eq!(extracted.typed_sites[0].inference.type_string, "str");
        assert!(extracted.typed_sites[0].is_return);
    }

    #[test]
    fn function_scope_byte_range_covers_its_own_body() {
        let src = "def outer():\n    pass\n";
        let (tree, source) = parse(Language::Python, src);
        let mut registry = EntityRegistry::default();
        let extracted = extract_module(&mut registry, "proj", "proj.mod", Language::Python, &tree, &source);

        let scope = extracted.scopes.iter().find(|s| s.qn == "proj.mod.outer").unwrap();
        assert!(scope.range.start < scope.range.end);
        assert!(scope.range.end <= source.len());
    }
}
