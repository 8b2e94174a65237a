// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph construction from an entity tree
//!
//! Construction runs in two phases:
//!
//! 1. Nodes are inserted sequentially, system → container → component.
//! 2. Relationships from declared metadata and (optionally) from diagram
//!    files are resolved and union-merged into edges. Diagram files are read
//!    and parsed concurrently on a bounded pool; one mutex guards the
//!    `(source, target)` dedup set together with the edge insertion.

use crate::diagram::{load_diagram_relationships, DiagramParser, DEFAULT_DIAGRAM_EXTENSION};
use crate::entity::{EntityRef, EntityTree, System};
use crate::error::{DiagramError, GraphError, Result};
use crate::graph::{ArchitectureGraph, GraphEdge, GraphNode};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Default number of diagram files parsed at the same time
pub const DEFAULT_MAX_CONCURRENT_PARSES: usize = 10;

/// Knobs for graph construction
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Upper bound on in-flight diagram tasks
    pub max_concurrent_parses: usize,
    /// Extension of the diagram file looked up per component
    pub diagram_extension: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_concurrent_parses: DEFAULT_MAX_CONCURRENT_PARSES,
            diagram_extension: DEFAULT_DIAGRAM_EXTENSION.to_string(),
        }
    }
}

/// Counters describing what happened during relationship merging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Edges contributed by declared metadata
    pub declared_edges: usize,
    /// Edges contributed by diagrams
    pub diagram_edges: usize,
    /// Relationships dropped because the pair already had an edge
    pub duplicates_dropped: usize,
    /// Relationships whose target was missing or ambiguous
    pub unresolved: usize,
    /// Components whose diagram could not be read or parsed
    pub diagram_failures: usize,
    /// Entities left out of the graph because their ID was empty,
    /// counting everything beneath them
    pub skipped_entities: usize,
}

/// Where a relationship came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeOrigin {
    Declared,
    Diagram,
}

impl EdgeOrigin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Declared => "explicit",
            Self::Diagram => "diagram",
        }
    }
}

/// The graph plus the dedup set, shared behind one mutex during phase 2
struct EdgeMerger {
    graph: ArchitectureGraph,
    seen: HashSet<(String, String)>,
    stats: BuildStats,
}

impl EdgeMerger {
    /// Resolve a raw target and insert the edge unless the pair is taken.
    /// Returns whether an edge was added.
    fn merge(
        &mut self,
        source: &str,
        raw_target: &str,
        description: &str,
        origin: EdgeOrigin,
    ) -> Result<bool> {
        let Some(target) = self.graph.resolve_id_excluding(raw_target, Some(source)) else {
            debug!(
                "Skipping {} relationship {} -> {}: target missing or ambiguous",
                origin.as_str(),
                source,
                raw_target
            );
            self.stats.unresolved += 1;
            return Ok(false);
        };

        if !self.seen.insert((source.to_string(), target.clone())) {
            self.stats.duplicates_dropped += 1;
            return Ok(false);
        }

        let edge = GraphEdge::new(source, target, description).with_metadata("source", origin.as_str());
        self.graph.add_edge(edge)?;
        match origin {
            EdgeOrigin::Declared => self.stats.declared_edges += 1,
            EdgeOrigin::Diagram => self.stats.diagram_edges += 1,
        }
        Ok(true)
    }
}

/// A component queued for diagram parsing
struct DiagramJob {
    qualified_id: String,
    short_id: String,
    dir: PathBuf,
}

/// Build the architecture graph for an entity tree.
///
/// Without a parser only declared relationships are used.
pub async fn build_graph(
    tree: &EntityTree,
    parser: Option<Arc<dyn DiagramParser>>,
    options: &BuildOptions,
) -> Result<ArchitectureGraph> {
    build_graph_with_stats(tree, parser, options)
        .await
        .map(|(graph, _)| graph)
}

/// Build the graph and report merge counters alongside it
pub async fn build_graph_with_stats(
    tree: &EntityTree,
    parser: Option<Arc<dyn DiagramParser>>,
    options: &BuildOptions,
) -> Result<(ArchitectureGraph, BuildStats)> {
    if options.max_concurrent_parses == 0 {
        return Err(GraphError::InvalidInput(
            "max_concurrent_parses must be at least 1".into(),
        ));
    }

    let (graph, skipped_entities) = insert_nodes(tree)?;
    let mut merger = EdgeMerger {
        graph,
        seen: HashSet::new(),
        stats: BuildStats {
            skipped_entities,
            ..BuildStats::default()
        },
    };

    // Declared relationships first, so their descriptions win on duplicates
    for entry in tree.components() {
        let source = entry.qualified_id();
        if !merger.graph.contains(&source) {
            continue;
        }
        for (target, description) in &entry.component.relationships {
            merger.merge(&source, target, description, EdgeOrigin::Declared)?;
        }
    }

    let merger = Arc::new(Mutex::new(merger));
    let mut failures = 0;

    if let Some(parser) = parser {
        let jobs: Vec<DiagramJob> = {
            let merger = merger.lock().unwrap_or_else(PoisonError::into_inner);
            let jobs = tree
                .components()
                .filter_map(|entry| {
                    let dir = entry.component.path.as_ref()?;
                    let qualified_id = entry.qualified_id();
                    merger.graph.contains(&qualified_id).then(|| DiagramJob {
                        qualified_id,
                        short_id: entry.component.id.clone(),
                        dir: dir.clone(),
                    })
                })
                .collect();
            jobs
        };
        failures = merge_diagrams(jobs.into_iter(), parser, Arc::clone(&merger), options).await;
    }

    let mut merger = Arc::try_unwrap(merger)
        .map_err(|_| GraphError::Validation("edge merger still shared after join".into()))?
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);
    merger.stats.diagram_failures = failures;

    merger.graph.validate()?;

    info!(
        "Built architecture graph: {} nodes, {} edges ({} declared, {} from diagrams, {} unresolved)",
        merger.graph.node_count(),
        merger.graph.edge_count(),
        merger.stats.declared_edges,
        merger.stats.diagram_edges,
        merger.stats.unresolved
    );

    Ok((merger.graph, merger.stats))
}

/// Phase 1: one node per entity, parents before children.
///
/// An entity with an empty ID is skipped together with its subtree, and
/// counted in the returned total.
fn insert_nodes(tree: &EntityTree) -> Result<(ArchitectureGraph, usize)> {
    let mut graph = ArchitectureGraph::new();
    let mut skipped = 0;

    for system in &tree.systems {
        if system.id.is_empty() {
            skipped += skip_empty("system", &system.name, subtree_size(system));
            continue;
        }
        let payload = EntityRef::System {
            system: system.id.clone(),
        };
        graph.add_node(GraphNode::new(payload, &system.name, &system.description))?;

        for container in &system.containers {
            if container.id.is_empty() {
                skipped += skip_empty("container", &container.name, 1 + container.components.len());
                continue;
            }
            let payload = EntityRef::Container {
                system: system.id.clone(),
                container: container.id.clone(),
            };
            let mut node = GraphNode::new(payload, &container.name, &container.description);
            if let Some(tech) = &container.technology {
                node = node.with_metadata("technology", tech);
            }
            graph.add_node(node)?;

            for component in &container.components {
                if component.id.is_empty() {
                    skipped += skip_empty("component", &component.name, 1);
                    continue;
                }
                let payload = EntityRef::Component {
                    system: system.id.clone(),
                    container: container.id.clone(),
                    component: component.id.clone(),
                };
                let mut node = GraphNode::new(payload, &component.name, &component.description);
                if let Some(tech) = &component.technology {
                    node = node.with_metadata("technology", tech);
                }
                graph.add_node(node)?;
            }
        }
    }

    debug!("Inserted {} nodes, skipped {}", graph.node_count(), skipped);
    Ok((graph, skipped))
}

fn subtree_size(system: &System) -> usize {
    1 + system
        .containers
        .iter()
        .map(|c| 1 + c.components.len())
        .sum::<usize>()
}

fn skip_empty(kind: &str, name: &str, count: usize) -> usize {
    warn!("Skipping {} {:?} with empty ID ({} entities left out)", kind, name, count);
    count
}

/// Phase 2, diagram source: fan out one task per component directory and
/// join them all. Returns the number of components that failed.
async fn merge_diagrams(
    jobs: impl Iterator<Item = DiagramJob>,
    parser: Arc<dyn DiagramParser>,
    merger: Arc<Mutex<EdgeMerger>>,
    options: &BuildOptions,
) -> usize {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrent_parses));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let parser = Arc::clone(&parser);
        let merger = Arc::clone(&merger);
        let extension = options.diagram_extension.clone();

        tasks.spawn(async move {
            let component = job.qualified_id.clone();
            let outcome = diagram_task(job, semaphore, parser, merger, extension).await;
            (component, outcome)
        });
    }

    let mut failures = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((component, Ok(added))) => {
                debug!("{}: {} edge(s) from diagram", component, added);
            }
            Ok((component, Err(e))) => {
                warn!("Ignoring diagram for {}: {}", component, e);
                failures += 1;
            }
            Err(e) => {
                warn!("Diagram task failed: {}", e);
                failures += 1;
            }
        }
    }
    failures
}

async fn diagram_task(
    job: DiagramJob,
    semaphore: Arc<Semaphore>,
    parser: Arc<dyn DiagramParser>,
    merger: Arc<Mutex<EdgeMerger>>,
    extension: String,
) -> std::result::Result<usize, DiagramError> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| DiagramError::Task(e.to_string()))?;

    let qualified_id = job.qualified_id.clone();
    let dir = job.dir.clone();
    let relationships = tokio::task::spawn_blocking(move || {
        load_diagram_relationships(parser.as_ref(), &qualified_id, &dir, &extension)
    })
    .await
    .map_err(|e| DiagramError::Task(e.to_string()))??;

    let mut merger = merger.lock().unwrap_or_else(PoisonError::into_inner);
    let mut added = 0;
    for rel in relationships {
        // A diagram may describe neighbours too; keep only this component's edges
        if rel.source != job.short_id && rel.source != job.qualified_id {
            continue;
        }
        match merger.merge(&job.qualified_id, &rel.target, &rel.label, EdgeOrigin::Diagram) {
            Ok(true) => added += 1,
            Ok(false) => {}
            Err(e) => warn!("Dropping diagram edge {} -> {}: {}", job.qualified_id, rel.target, e),
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{ArrowParser, DiagramRelationship, ParseContext};
    use crate::entity::{Component, Container, System};
    use crate::test_support::{component, component_at, container, flat_id, flat_tree, system};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    async fn build(tree: &EntityTree) -> ArchitectureGraph {
        build_graph(tree, None, &BuildOptions::default()).await.unwrap()
    }

    async fn build_with_diagrams(tree: &EntityTree) -> (ArchitectureGraph, BuildStats) {
        let parser: Arc<dyn DiagramParser> = Arc::new(ArrowParser);
        build_graph_with_stats(tree, Some(parser), &BuildOptions::default())
            .await
            .unwrap()
    }

    fn diagram_dir(root: &TempDir, name: &str, text: &str) -> PathBuf {
        let dir = root.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.d2")), text).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_ecommerce_example() {
        let tree = EntityTree::new(vec![System {
            id: "e-commerce".into(),
            name: "E-Commerce".into(),
            description: String::new(),
            containers: vec![Container {
                id: "api-server".into(),
                name: "API Server".into(),
                components: vec![Component {
                    id: "authentication".into(),
                    name: "Authentication".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }]);

        let graph = build(&tree).await;
        assert_eq!(graph.node_count(), 3);

        let sys = graph.node("system:e-commerce").unwrap();
        let cont = graph.node("container:e-commerce/api-server").unwrap();
        let comp = graph.node("component:e-commerce/api-server/authentication").unwrap();
        assert_eq!(cont.parent_id, sys.id);
        assert_eq!(comp.parent_id, cont.id);
        assert_eq!(comp.name, "Authentication");
    }

    #[tokio::test]
    async fn test_node_count_matches_tree() {
        let tree = EntityTree::new(vec![
            system("a", vec![container("web", vec![component("x", &[]), component("y", &[])])]),
            system("b", vec![container("db", vec![]), container("queue", vec![component("z", &[])])]),
            system("c", vec![]),
        ]);
        let graph = build(&tree).await;
        // (1 + 1 + 2) + (1 + 2 + 1) + 1
        assert_eq!(graph.node_count(), 9);
        assert_eq!(graph.node_count(), tree.entity_count());
    }

    #[tokio::test]
    async fn test_duplicate_short_names_across_systems() {
        let one = EntityTree::new(vec![system(
            "shop",
            vec![container("api", vec![component("auth", &[])])],
        )]);
        let two = EntityTree::new(vec![
            system("shop", vec![container("api", vec![component("auth", &[])])]),
            system("billing", vec![container("api", vec![component("auth", &[])])]),
        ]);

        let g1 = build(&one).await;
        let g2 = build(&two).await;
        assert_eq!(g2.node_count(), 2 * g1.node_count());
        assert!(g2.node("component:shop/api/auth").is_some());
        assert!(g2.node("component:billing/api/auth").is_some());
    }

    #[tokio::test]
    async fn test_short_target_resolves_to_single_edge() {
        let tree = flat_tree(vec![
            component("cart", &[("auth", "checks sessions")]),
            component("auth", &[]),
        ]);
        let graph = build(&tree).await;

        assert_eq!(graph.edge_count(), 1);
        let edges = graph.outgoing_edges(&flat_id("cart"));
        assert_eq!(edges[0].target, flat_id("auth"));
        assert_eq!(edges[0].description, "checks sessions");
        assert_eq!(edges[0].metadata.get("source").map(String::as_str), Some("explicit"));
        assert!((edges[0].weight - 0.8).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_qualified_target_resolves() {
        let tree = EntityTree::new(vec![
            system("shop", vec![container("api", vec![component("cart", &[("component:billing/api/auth", "")])])]),
            system("billing", vec![container("api", vec![component("auth", &[])])]),
        ]);
        let graph = build(&tree).await;
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.incoming_edges("component:billing/api/auth").len(), 1);
    }

    #[tokio::test]
    async fn test_ambiguous_and_missing_targets_are_skipped() {
        let tree = EntityTree::new(vec![
            system("shop", vec![container("api", vec![
                component("cart", &[("auth", ""), ("ghost", "")]),
                component("auth", &[]),
            ])]),
            system("billing", vec![container("api", vec![component("auth", &[])])]),
        ]);
        let (graph, stats) = build_graph_with_stats(&tree, None, &BuildOptions::default())
            .await
            .unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.unresolved, 2);
    }

    #[tokio::test]
    async fn test_self_is_excluded_from_short_id_candidates() {
        // shop's auth names "auth"; excluding itself leaves billing's auth
        let tree = EntityTree::new(vec![
            system("shop", vec![container("api", vec![component("auth", &[("auth", "delegates")])])]),
            system("billing", vec![container("api", vec![component("auth", &[])])]),
        ]);
        let graph = build(&tree).await;
        let edges = graph.outgoing_edges("component:shop/api/auth");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "component:billing/api/auth");
    }

    #[tokio::test]
    async fn test_same_pair_from_both_sources_yields_one_edge() {
        let root = TempDir::new().unwrap();
        let dir = diagram_dir(&root, "cart", "cart -> auth: from diagram\n");
        let tree = flat_tree(vec![
            component_at("cart", &[("auth", "declared")], dir),
            component("auth", &[]),
        ]);

        let (graph, stats) = build_with_diagrams(&tree).await;
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.duplicates_dropped, 1);
        // Declared metadata is merged first and wins
        assert_eq!(graph.outgoing_edges(&flat_id("cart"))[0].description, "declared");
    }

    #[tokio::test]
    async fn test_distinct_pairs_from_each_source_yield_two_edges() {
        let root = TempDir::new().unwrap();
        let dir = diagram_dir(&root, "cart", "cart -> payments: charges\n");
        let tree = flat_tree(vec![
            component_at("cart", &[("auth", "declared")], dir),
            component("auth", &[]),
            component("payments", &[]),
        ]);

        let (graph, stats) = build_with_diagrams(&tree).await;
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(stats.declared_edges, 1);
        assert_eq!(stats.diagram_edges, 1);

        let diagram_edge = graph
            .outgoing_edges(&flat_id("cart"))
            .into_iter()
            .find(|e| e.target == flat_id("payments"))
            .unwrap();
        assert_eq!(diagram_edge.metadata.get("source").map(String::as_str), Some("diagram"));
        assert_eq!(diagram_edge.description, "charges");
    }

    #[tokio::test]
    async fn test_quoted_qualified_diagram_target_resolves() {
        let root = TempDir::new().unwrap();
        let dir = diagram_dir(
            &root,
            "cart",
            "\"component:shop/api/cart\" -> \"component:billing/api/auth\": charges\n",
        );
        let tree = EntityTree::new(vec![
            system("shop", vec![container("api", vec![
                component_at("cart", &[], dir),
                component("auth", &[]),
            ])]),
            system("billing", vec![container("api", vec![component("auth", &[])])]),
        ]);

        let (graph, stats) = build_with_diagrams(&tree).await;
        assert_eq!(stats.diagram_edges, 1);
        assert_eq!(stats.unresolved, 0);
        let edges = graph.outgoing_edges("component:shop/api/cart");
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, "component:billing/api/auth");
        assert_eq!(edges[0].description, "charges");
    }

    #[tokio::test]
    async fn test_diagram_edges_of_other_components_are_ignored() {
        let root = TempDir::new().unwrap();
        let dir = diagram_dir(&root, "cart", "cart -> auth\nauth -> payments\n");
        let tree = flat_tree(vec![
            component_at("cart", &[], dir),
            component("auth", &[]),
            component("payments", &[]),
        ]);

        let (graph, _) = build_with_diagrams(&tree).await;
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.outgoing_edges(&flat_id("auth")).is_empty());
    }

    #[tokio::test]
    async fn test_broken_diagram_does_not_fail_build() {
        let root = TempDir::new().unwrap();
        let broken = diagram_dir(&root, "cart", "cart -> \n");
        let good = diagram_dir(&root, "auth", "auth -> payments\n");
        let tree = flat_tree(vec![
            component_at("cart", &[("auth", "")], broken),
            component_at("auth", &[], good),
            component_at("payments", &[], root.path().join("does-not-exist")),
        ]);

        let (graph, stats) = build_with_diagrams(&tree).await;
        assert_eq!(stats.diagram_failures, 1);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.outgoing_edges(&flat_id("auth")).len(), 1);
    }

    struct PanickingParser;

    impl DiagramParser for PanickingParser {
        fn parse_relationships(
            &self,
            _ctx: &ParseContext,
            _source: &str,
        ) -> std::result::Result<Vec<DiagramRelationship>, DiagramError> {
            panic!("parser bug");
        }
    }

    #[tokio::test]
    async fn test_panicking_parser_is_contained() {
        let root = TempDir::new().unwrap();
        let dir = diagram_dir(&root, "cart", "cart -> auth\n");
        let tree = flat_tree(vec![component_at("cart", &[("auth", "")], dir), component("auth", &[])]);

        let parser: Arc<dyn DiagramParser> = Arc::new(PanickingParser);
        let (graph, stats) = build_graph_with_stats(&tree, Some(parser), &BuildOptions::default())
            .await
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(stats.diagram_failures, 1);
    }

    /// Tracks how many parses run at once
    struct SlowParser {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl DiagramParser for SlowParser {
        fn parse_relationships(
            &self,
            _ctx: &ParseContext,
            _source: &str,
        ) -> std::result::Result<Vec<DiagramRelationship>, DiagramError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parse_concurrency_is_bounded() {
        let root = TempDir::new().unwrap();
        let components = (0..8)
            .map(|i| {
                let name = format!("c{i}");
                let dir = diagram_dir(&root, &name, "");
                component_at(&name, &[], dir)
            })
            .collect();
        let tree = flat_tree(components);

        let parser = Arc::new(SlowParser {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let options = BuildOptions {
            max_concurrent_parses: 2,
            ..Default::default()
        };
        let shared: Arc<dyn DiagramParser> = parser.clone();
        build_graph(&tree, Some(shared), &options).await.unwrap();

        let peak = parser.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 2, "peak concurrency was {peak}");
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let options = BuildOptions {
            max_concurrent_parses: 0,
            ..Default::default()
        };
        let err = build_graph(&EntityTree::default(), None, &options).await.unwrap_err();
        assert!(matches!(err, GraphError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_empty_ids_are_skipped() {
        let tree = EntityTree::new(vec![
            system("shop", vec![
                container("api", vec![
                    component("", &[("auth", "orphan")]),
                    component("cart", &[("auth", "checks")]),
                    component("auth", &[]),
                ]),
                container("", vec![component("ghost", &[])]),
            ]),
            system("", vec![container("x", vec![component("y", &[])])]),
        ]);

        let (graph, stats) = build_graph_with_stats(&tree, None, &BuildOptions::default())
            .await
            .unwrap();
        // shop, api, cart, auth
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 1);
        // component "" + container "" with ghost + system "" with x and y
        assert_eq!(stats.skipped_entities, 1 + 2 + 3);
        assert!(graph.resolve_id("ghost").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_entities_collide() {
        let tree = flat_tree(vec![component("auth", &[]), component("auth", &[])]);
        let err = build_graph(&tree, None, &BuildOptions::default()).await.unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(id) if id == flat_id("auth")));
    }
}
