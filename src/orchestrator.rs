//! Wires `ConfigService`-produced `FeatureFlags` to a `Context` and runs
//! every pass strictly in order: no pass observes partial output of the next.
//!
//! The per-file parse/extract step is the only stage that is itself
//! parallelizable (see `ProcessManager`); this module runs it inline and
//! leaves scheduling strategy to the caller, which may instead drive
//! `run_file_phase` bodies through a `ProcessManager::run_batch` closure.

use crate::config::FeatureFlags;
use crate::context::Context;
use crate::entity::{extract_module, extract_relations};
use crate::framework;
use crate::graph::{join_qn, EdgeIngest, EntityRef, Label, NodeIngest, RelationType};
use crate::parser::default_queries_dir;
use crate::prescan::{DiscoveredFile, Language, PreScanner};
use crate::resolver::{
    link_caught_by, link_decorators, link_throws, link_typed_sites, resolve_calls, CatchSite, CrossFileResolver, DecoratorSite,
    ImportGraph, ThrowSite, TypedSite, UnresolvedCall,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, info_span, warn};

pub struct SourceFile {
    pub path: String,
    pub language: Language,
    pub source: String,
}

impl From<DiscoveredFile> for SourceFile {
    fn from(file: DiscoveredFile) -> Self {
        Self { path: file.path, language: file.language, source: file.source }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PipelineSummary {
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub files_failed: usize,
    pub nodes_ingested: usize,
    pub edges_ingested: usize,
}

/// Extra resolver-pass inputs a caller may already have on hand (e.g. from a
/// prior incremental run). `Orchestrator::run` always derives its own calls,
/// typed sites, decorator/throw/catch sites, and import graph from the real
/// AST during extraction; anything passed in here is folded in alongside
/// that, not used in place of it.
#[derive(Default)]
pub struct ResolverInputs {
    pub calls: Vec<UnresolvedCall>,
    pub typed_sites: Vec<TypedSite>,
    /// Grouped by the source file's language, since `link_decorators`
    /// picks one relation type (`DECORATES` vs `ANNOTATES`) per call.
    pub decorator_sites: Vec<(Language, Vec<DecoratorSite>)>,
    pub throw_sites: Vec<ThrowSite>,
    pub catch_sites: Vec<CatchSite>,
    pub import_graph: ImportGraph,
}

impl ResolverInputs {
    fn merge_from(&mut self, other: ResolverInputs) {
        self.calls.extend(other.calls);
        self.typed_sites.extend(other.typed_sites);
        self.decorator_sites.extend(other.decorator_sites);
        self.throw_sites.extend(other.throw_sites);
        self.catch_sites.extend(other.catch_sites);
        self.import_graph.merge(&other.import_graph);
    }
}

pub struct Orchestrator {
    pub flags: FeatureFlags,
    pub context: Context,
}

impl Orchestrator {
    pub fn new(flags: FeatureFlags, context: Context) -> Self {
        Self { flags, context }
    }

    pub async fn run(&self, files: &[SourceFile], resolver_inputs: ResolverInputs) -> PipelineSummary {
        let mut summary = PipelineSummary { files_scanned: files.len(), ..Default::default() };
        let mut collected = ResolverInputs::default();

        self.run_prescan_phase(files);
        self.run_parse_and_extract_phase(files, &mut summary, &mut collected).await;

        if self.flags.framework_linking {
            self.run_framework_phase(files, &mut summary).await;
        }
        if self.flags.tailwind_processing {
            self.run_tailwind_phase(files, &mut summary).await;
        }

        collected.merge_from(resolver_inputs);

        self.run_resolver_phase(&collected, &mut summary).await;
        self.run_cross_file_phase(&collected.import_graph);

        summary
    }

    fn run_prescan_phase(&self, files: &[SourceFile]) {
        let span = info_span!("prescan", file_count = files.len());
        let _enter = span.enter();
        let mut index = self.context.prescan_index.lock().unwrap();
        for file in files {
            let module_qn = module_qn_for(&self.context.project_name, &file.path);
            PreScanner::scan_into(&mut index, &module_qn, file.language, &file.source);
        }
        info!(symbols = index.symbol_to_modules.len(), "prescan complete");
    }

    async fn run_parse_and_extract_phase(&self, files: &[SourceFile], summary: &mut PipelineSummary, collected: &mut ResolverInputs) {
        let span = info_span!("parse_and_extract", file_count = files.len());
        let _enter = span.enter();
        let queries_dir = default_queries_dir();

        for file in files {
            if let Some(incremental) = &self.context.incremental {
                match incremental.needs_parsing(Path::new(&file.path)) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => warn!(file = %file.path, %err, "cache lookup failed, treating as cold"),
                }
            }

            let module_qn = module_qn_for(&self.context.project_name, &file.path);
            let parsed = self.context.parser_driver.parse(&file.path, file.language, file.source.clone());
            let (tree, source) = match parsed {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(file = %file.path, %err, "parse failed, skipping file");
                    summary.files_failed += 1;
                    continue;
                }
            };

            let extracted = {
                let mut registry = self.context.entity_registry.lock().unwrap();
                registry.register_module(&module_qn, Path::new(&file.path));
                extract_module(&mut registry, &self.context.project_name, &module_qn, file.language, tree.as_ref(), source.as_str())
            };

            let (chain_nodes, chain_edges) = containment_chain(&self.context.project_name, &file.path, &module_qn);
            self.ingest_nodes(&chain_nodes).await;
            self.ingest_edges(&chain_edges).await;
            summary.nodes_ingested += chain_nodes.len();
            summary.edges_ingested += chain_edges.len();

            self.ingest_nodes(&extracted.nodes).await;
            self.ingest_edges(&extracted.edges).await;
            summary.nodes_ingested += extracted.nodes.len();
            summary.edges_ingested += extracted.edges.len();
            summary.files_parsed += 1;

            let relation_sites = extract_relations(
                &self.context.parser_driver,
                &queries_dir,
                &module_qn,
                file.language,
                tree.as_ref(),
                source.as_str(),
                &extracted.scopes,
            );

            {
                let mut inference_ctx = self.context.inference_context.lock().unwrap();
                for import in &relation_sites.imports {
                    inference_ctx.record_import_alias(&import.alias, &import.target_module);
                }
            }
            for import in &relation_sites.imports {
                collected.import_graph.record(&module_qn, &import.alias, &import.target_module);
            }

            collected.calls.extend(relation_sites.calls);
            if !relation_sites.decorator_sites.is_empty() {
                collected.decorator_sites.push((file.language, relation_sites.decorator_sites));
            }
            collected.throw_sites.extend(relation_sites.throw_sites);
            collected.catch_sites.extend(relation_sites.catch_sites);
            collected.typed_sites.extend(extracted.typed_sites);
        }
    }

    async fn run_framework_phase(&self, files: &[SourceFile], summary: &mut PipelineSummary) {
        let span = info_span!("framework_linking", file_count = files.len());
        let _enter = span.enter();
        let mut nodes_emitted = 0usize;
        let mut edges_emitted = 0usize;

        let template_paths = files
            .iter()
            .filter(|f| matches!(extension_of(&f.path), "html" | "htm"))
            .map(|f| Path::new(&f.path).to_path_buf());
        let template_index = framework::build_template_index(Path::new(""), template_paths);

        for file in files {
            let module_qn = module_qn_for(&self.context.project_name, &file.path);
            let endpoints = match extension_of(&file.path) {
                "cs" => framework::extract_csharp_endpoints(&file.source),
                "go" => framework::extract_go_endpoints(&file.source),
                "php" => framework::extract_php_endpoints(&file.source),
                "html" | "htm" => framework::extract_htmx_endpoints(&file.source),
                "ts" | "tsx" | "js" | "jsx" => framework::extract_next_endpoints(&file.path, &file.source),
                _ => Vec::new(),
            };

            for endpoint in &endpoints {
                let env_file_vars = HashMap::new();
                let qn = framework::endpoint_qn(&self.context.project_name, &endpoint.framework, &endpoint.method, &endpoint.path, &env_file_vars);
                let node = NodeIngest::new(Label::Endpoint, &qn)
                    .with("http_method", endpoint.method.clone())
                    .with("route_path", endpoint.path.clone())
                    .with("framework", endpoint.framework.clone());
                let endpoint_ref = EntityRef::qn(Label::Endpoint, &qn);
                self.context.ingestor.ensure_node(&endpoint_ref, &node.properties).await.ok();
                nodes_emitted += 1;

                let module_ref = EntityRef::qn(Label::Module, &module_qn);
                let module_rel = if endpoint.framework == "htmx" { RelationType::RequestsEndpoint } else { RelationType::HasEndpoint };
                self.context.ingestor.ensure_relationship(&module_ref, module_rel.as_str(), &endpoint_ref, None).await.ok();
                edges_emitted += 1;

                match (&endpoint.controller_name, &endpoint.handler_name) {
                    (Some(controller), handler) => {
                        let controller_qn = join_qn(&[&module_qn, controller]);
                        let controller_ref = EntityRef::qn(Label::Class, controller_qn.clone());
                        self.context
                            .ingestor
                            .ensure_relationship(&endpoint_ref, RelationType::RoutesToController.as_str(), &controller_ref, None)
                            .await
                            .ok();
                        edges_emitted += 1;

                        if let Some(handler) = handler {
                            let action_ref = EntityRef::qn(Label::Method, join_qn(&[&controller_qn, handler]));
                            self.context
                                .ingestor
                                .ensure_relationship(&endpoint_ref, RelationType::RoutesToAction.as_str(), &action_ref, None)
                                .await
                                .ok();
                            edges_emitted += 1;
                        }
                    }
                    (None, Some(handler)) => {
                        let action_ref = EntityRef::qn(Label::Function, join_qn(&[&module_qn, handler]));
                        self.context
                            .ingestor
                            .ensure_relationship(&endpoint_ref, RelationType::RoutesToAction.as_str(), &action_ref, None)
                            .await
                            .ok();
                        edges_emitted += 1;
                    }
                    (None, None) => {}
                }
            }

            let bindings = match extension_of(&file.path) {
                "cs" => framework::link_spring_di(&file.source),
                "ts" | "tsx" | "js" | "jsx" => framework::link_nest_di(&file.source),
                _ => Vec::new(),
            };
            for binding in &bindings {
                let consumer_ref = EntityRef::qn(Label::Class, join_qn(&[&module_qn, &binding.consumer]));
                let provider_ref = EntityRef::qn(Label::Class, join_qn(&[&module_qn, &binding.provider]));
                self.context
                    .ingestor
                    .ensure_relationship(&consumer_ref, RelationType::RegistersService.as_str(), &provider_ref, None)
                    .await
                    .ok();
                self.context
                    .ingestor
                    .ensure_relationship(&provider_ref, RelationType::ProvidesService.as_str(), &consumer_ref, None)
                    .await
                    .ok();
                edges_emitted += 2;
            }

            if matches!(extension_of(&file.path), "html" | "htm") && framework::looks_like_template(&file.source) {
                let extraction = framework::parse_template(&file.source);
                let file_ref = EntityRef::qn(Label::File, &module_qn);
                for referenced in extraction.includes.iter().chain(extraction.extends.iter()) {
                    let Some(target_path) = template_index.get(referenced) else { continue };
                    let target_qn = module_qn_for(&self.context.project_name, target_path);
                    if target_qn == module_qn {
                        continue;
                    }
                    let target_ref = EntityRef::qn(Label::File, &target_qn);
                    self.context
                        .ingestor
                        .ensure_relationship(&file_ref, RelationType::Embeds.as_str(), &target_ref, None)
                        .await
                        .ok();
                    edges_emitted += 1;
                }
            }
        }

        info!(endpoints = nodes_emitted, edges = edges_emitted, "framework linking complete");
        summary.nodes_ingested += nodes_emitted;
        summary.edges_ingested += edges_emitted;
    }

    async fn run_tailwind_phase(&self, files: &[SourceFile], summary: &mut PipelineSummary) {
        let span = info_span!("tailwind", file_count = files.len());
        let _enter = span.enter();
        let mut module_utilities: HashMap<String, HashSet<String>> = HashMap::new();
        let mut all_utilities: HashSet<String> = HashSet::new();

        for file in files {
            let classes = match extension_of(&file.path) {
                "css" | "scss" => framework::scan_stylesheet(&file.source).utilities,
                "html" | "htm" | "jsx" | "tsx" | "vue" => framework::scan_markup(&file.source),
                _ => continue,
            };
            if classes.is_empty() {
                continue;
            }
            let module_qn = module_qn_for(&self.context.project_name, &file.path);
            let entry = module_utilities.entry(module_qn).or_default();
            for class in classes {
                all_utilities.insert(class.clone());
                entry.insert(class);
            }
        }

        for utility in &all_utilities {
            let qn = format!("{}.utility.{}", self.context.project_name, utility);
            let node = NodeIngest::new(Label::TailwindUtility, &qn).with("utility", utility.clone());
            self.context.ingestor.ensure_node(&EntityRef::qn(Label::TailwindUtility, &qn), &node.properties).await.ok();
        }

        let mut edges_emitted = 0usize;
        for (module_qn, utilities) in &module_utilities {
            for utility in utilities {
                let utility_qn = format!("{}.utility.{}", self.context.project_name, utility);
                self.context
                    .ingestor
                    .ensure_relationship(
                        &EntityRef::qn(Label::Module, module_qn.clone()),
                        RelationType::UsesUtility.as_str(),
                        &EntityRef::qn(Label::TailwindUtility, utility_qn),
                        None,
                    )
                    .await
                    .ok();
                edges_emitted += 1;
            }
        }

        info!(utilities = all_utilities.len(), edges = edges_emitted, "tailwind scan complete");
        summary.nodes_ingested += all_utilities.len();
        summary.edges_ingested += edges_emitted;
    }

    async fn run_resolver_phase(&self, inputs: &ResolverInputs, summary: &mut PipelineSummary) {
        let span = info_span!("resolver", calls = inputs.calls.len());
        let _enter = span.enter();

        let registry = self.context.entity_registry.lock().unwrap();
        let prescan = self.context.prescan_index.lock().unwrap();
        let inference_ctx = self.context.inference_context.lock().unwrap();

        let mut edges = resolve_calls(&registry, &inference_ctx, &prescan, &inputs.calls);
        if self.flags.type_inference {
            let type_output = link_typed_sites(&registry, &self.context.project_name, &inputs.typed_sites);
            self.ingest_nodes(&type_output.nodes).await;
            edges.extend(type_output.edges);
        }
        if self.flags.extended_relations {
            for (language, sites) in &inputs.decorator_sites {
                edges.extend(link_decorators(*language, sites));
            }
            edges.extend(link_throws(&self.context.project_name, &inputs.throw_sites));
            edges.extend(link_caught_by(&self.context.project_name, &inputs.catch_sites));
        }

        drop(inference_ctx);
        drop(prescan);
        drop(registry);

        self.ingest_edges(&edges).await;
        summary.edges_ingested += edges.len();
        info!(edges_emitted = edges.len(), "resolver pass complete");
    }

    fn run_cross_file_phase(&self, graph: &ImportGraph) {
        let span = info_span!("cross_file");
        let _enter = span.enter();
        let summary = CrossFileResolver::summarize(graph, 10);
        CrossFileResolver::log_summary(&summary);
    }

    async fn ingest_nodes(&self, nodes: &[NodeIngest]) {
        for node in nodes {
            let Some(reference) = node.reference() else { continue };
            if let Err(err) = self.context.ingestor.ensure_node(&reference, &node.properties).await {
                if self.flags.strict_ingest {
                    warn!(%err, "ingest error (strict mode would propagate this)");
                } else {
                    warn!(%err, "ingest error, continuing");
                }
            }
        }
    }

    async fn ingest_edges(&self, edges: &[EdgeIngest]) {
        for edge in edges {
            if let Err(err) = self
                .context
                .ingestor
                .ensure_relationship(&edge.source, edge.rel_type.as_str(), &edge.target, Some(&edge.properties))
                .await
            {
                if self.flags.strict_ingest {
                    warn!(%err, "ingest error (strict mode would propagate this)");
                } else {
                    warn!(%err, "ingest error, continuing");
                }
            }
        }
    }
}

/// Builds the `Project -> Folder -> ... -> File -> Module` containment chain
/// for one source file. Re-emitting the same `Project`/`Folder` nodes across
/// files is safe: `ensure_node` is an idempotent upsert.
fn containment_chain(project: &str, path: &str, module_qn: &str) -> (Vec<NodeIngest>, Vec<EdgeIngest>) {
    let mut nodes = vec![NodeIngest::new(Label::Project, project).with("name", project)];
    let mut edges = Vec::new();

    let normalized = path.replace('\\', "/");
    let mut components: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = components.pop().unwrap_or(normalized.as_str()).to_string();

    let mut parent_ref = EntityRef::qn(Label::Project, project.to_string());
    let mut acc = String::new();
    for component in &components {
        acc = if acc.is_empty() { component.to_string() } else { format!("{acc}.{component}") };
        let folder_qn = format!("{project}.{acc}");
        nodes.push(NodeIngest::new(Label::Folder, &folder_qn).with("name", *component));
        let folder_ref = EntityRef::qn(Label::Folder, folder_qn);
        edges.push(EdgeIngest::new(parent_ref.clone(), RelationType::Contains, folder_ref.clone()));
        parent_ref = folder_ref;
    }

    // Shares its QN with the `Module` it contains: one source file is one
    // module in this pipeline, so the two just differ by label.
    let file_qn = module_qn.to_string();
    nodes.push(NodeIngest::new(Label::File, &file_qn).with("name", file_name).with("path", normalized));
    let file_ref = EntityRef::qn(Label::File, file_qn);
    edges.push(EdgeIngest::new(parent_ref, RelationType::Contains, file_ref.clone()));
    edges.push(EdgeIngest::new(file_ref, RelationType::Contains, EntityRef::qn(Label::Module, module_qn.to_string())));

    (nodes, edges)
}

fn extension_of(path: &str) -> &str {
    Path::new(path).extension().and_then(|ext| ext.to_str()).unwrap_or("")
}

fn module_qn_for(project: &str, path: &str) -> String {
    let stem = Path::new(path).with_extension("");
    let dotted = stem.to_string_lossy().replace(['/', '\\'], ".");
    format!("{project}.{dotted}")
}
