//! Node and edge vocabulary for the output property graph, and the
//! `EntityRef` tuple used to address a node at the ingestor boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node labels emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    Project,
    Folder,
    File,
    Module,
    Class,
    Interface,
    Function,
    Method,
    Type,
    Endpoint,
    Hook,
    Block,
    Asset,
    TailwindUtility,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Project => "Project",
            Label::Folder => "Folder",
            Label::File => "File",
            Label::Module => "Module",
            Label::Class => "Class",
            Label::Interface => "Interface",
            Label::Function => "Function",
            Label::Method => "Method",
            Label::Type => "Type",
            Label::Endpoint => "Endpoint",
            Label::Hook => "Hook",
            Label::Block => "Block",
            Label::Asset => "Asset",
            Label::TailwindUtility => "TailwindUtility",
        }
    }
}

/// Edge types emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Contains,
    Imports,
    Calls,
    Inherits,
    Implements,
    ReturnsType,
    ParameterType,
    Throws,
    CaughtBy,
    Decorates,
    Annotates,
    HasEndpoint,
    RoutesToController,
    RoutesToAction,
    RequestsEndpoint,
    UsesMiddleware,
    RegistersService,
    ProvidesService,
    RendersView,
    Embeds,
    UsesHandler,
    UsesUtility,
    UsesAsset,
    Hooks,
    RegistersBlock,
    EloquentRelation,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Contains => "CONTAINS",
            RelationType::Imports => "IMPORTS",
            RelationType::Calls => "CALLS",
            RelationType::Inherits => "INHERITS",
            RelationType::Implements => "IMPLEMENTS",
            RelationType::ReturnsType => "RETURNS_TYPE",
            RelationType::ParameterType => "PARAMETER_TYPE",
            RelationType::Throws => "THROWS",
            RelationType::CaughtBy => "CAUGHT_BY",
            RelationType::Decorates => "DECORATES",
            RelationType::Annotates => "ANNOTATES",
            RelationType::HasEndpoint => "HAS_ENDPOINT",
            RelationType::RoutesToController => "ROUTES_TO_CONTROLLER",
            RelationType::RoutesToAction => "ROUTES_TO_ACTION",
            RelationType::RequestsEndpoint => "REQUESTS_ENDPOINT",
            RelationType::UsesMiddleware => "USES_MIDDLEWARE",
            RelationType::RegistersService => "REGISTERS_SERVICE",
            RelationType::ProvidesService => "PROVIDES_SERVICE",
            RelationType::RendersView => "RENDERS_VIEW",
            RelationType::Embeds => "EMBEDS",
            RelationType::UsesHandler => "USES_HANDLER",
            RelationType::UsesUtility => "USES_UTILITY",
            RelationType::UsesAsset => "USES_ASSET",
            RelationType::Hooks => "HOOKS",
            RelationType::RegistersBlock => "REGISTERS_BLOCK",
            RelationType::EloquentRelation => "ELOQUENT_RELATION",
        }
    }
}

pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Reference to a node at the ingestor boundary: `(label, key_property, key_value)`.
///
/// Every call site builds one of these instead of passing positional
/// `(Label, &str, String)` tuples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub label: Label,
    pub key: String,
    pub value: String,
}

impl EntityRef {
    pub fn qn(label: Label, qualified_name: impl Into<String>) -> Self {
        Self {
            label,
            key: "qualified_name".to_string(),
            value: qualified_name.into(),
        }
    }

    pub fn keyed(label: Label, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A node pending ingest.
#[derive(Debug, Clone)]
pub struct NodeIngest {
    pub label: Label,
    pub properties: PropertyMap,
}

impl NodeIngest {
    pub fn new(label: Label, qualified_name: impl Into<String>) -> Self {
        let mut properties = PropertyMap::new();
        properties.insert(
            "qualified_name".to_string(),
            serde_json::Value::String(qualified_name.into()),
        );
        Self { label, properties }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.properties
            .insert("is_placeholder".to_string(), serde_json::Value::Bool(true));
        self
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.properties.get("qualified_name").and_then(|v| v.as_str())
    }

    pub fn reference(&self) -> Option<EntityRef> {
        self.qualified_name()
            .map(|qn| EntityRef::qn(self.label, qn))
    }
}

/// An edge pending ingest.
#[derive(Debug, Clone)]
pub struct EdgeIngest {
    pub source: EntityRef,
    pub rel_type: RelationType,
    pub target: EntityRef,
    pub properties: PropertyMap,
}

impl EdgeIngest {
    pub fn new(source: EntityRef, rel_type: RelationType, target: EntityRef) -> Self {
        Self {
            source,
            rel_type,
            target,
            properties: PropertyMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Joins a module path's segments into a qualified name anchored at the project.
pub fn join_qn(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(".")
}
