// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Graph data structures and queries for the architecture graph

use crate::entity::EntityRef;
use crate::error::{GraphError, Result};
use crate::identity::{parse_qualified_id, qualified_id, NodeKind};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt::Write as _;

/// Relationship type used for every edge today
pub const DEPENDS_ON: &str = "depends-on";

/// Weight assigned to edges unless a source says otherwise
pub const DEFAULT_EDGE_WEIGHT: f64 = 0.8;

/// A system, container or component in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Qualified identifier
    pub id: String,
    /// C4 kind
    pub kind: NodeKind,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Hierarchy level, always `kind.level()`
    pub level: u8,
    /// Qualified ID of the parent node, empty for systems
    pub parent_id: String,
    /// The entity this node was derived from
    pub payload: EntityRef,
    /// Free-form attributes (e.g. technology)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl GraphNode {
    /// Create a node for an entity, deriving ID, level and parent from it
    #[must_use]
    pub fn new(payload: EntityRef, name: impl Into<String>, description: impl Into<String>) -> Self {
        let kind = payload.kind();
        let parent_id = match &payload {
            EntityRef::System { .. } => String::new(),
            EntityRef::Container { system, .. } => qualified_id(NodeKind::System, system, "", ""),
            EntityRef::Component {
                system, container, ..
            } => qualified_id(NodeKind::Container, system, container, ""),
        };

        Self {
            id: payload.qualified_id(),
            kind,
            name: name.into(),
            description: description.into(),
            level: kind.level(),
            parent_id,
            payload,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The entity's bare identifier
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.payload.short_id()
    }
}

/// A directed dependency between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Content-hash ID: edge:<hash of (source, target)>
    pub id: String,
    /// Qualified ID of the depending node
    pub source: String,
    /// Qualified ID of the node depended upon
    pub target: String,
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Human-readable description
    pub description: String,
    /// Edge weight
    pub weight: f64,
    /// Provenance and other attributes
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl GraphEdge {
    /// Create a `depends-on` edge with the default weight
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, description: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::generate_id(&source, &target),
            source,
            target,
            edge_type: DEPENDS_ON.to_string(),
            description: description.into(),
            weight: DEFAULT_EDGE_WEIGHT,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Generate a deterministic ID for an edge
    #[must_use]
    pub fn generate_id(source: &str, target: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update([0u8]);
        hasher.update(target.as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("edge:{}", &hash[..8])
    }
}

/// The architecture graph with petgraph backing for adjacency
#[derive(Debug, Clone)]
pub struct ArchitectureGraph {
    /// Nodes and edges; petgraph indexes both edge directions
    graph: DiGraph<GraphNode, GraphEdge>,
    /// Map from qualified ID to node index
    node_indices: HashMap<String, NodeIndex>,
    /// Parent qualified ID → child qualified IDs
    children: HashMap<String, Vec<String>>,
    /// Short ID → qualified IDs sharing it
    short_ids: HashMap<String, Vec<String>>,
}

impl Default for ArchitectureGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchitectureGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            children: HashMap::new(),
            short_ids: HashMap::new(),
        }
    }

    /// Insert a node, failing if its qualified ID is taken
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        if self.node_indices.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }

        let id = node.id.clone();
        self.short_ids
            .entry(node.short_id().to_string())
            .or_default()
            .push(id.clone());
        if !node.parent_id.is_empty() {
            self.children
                .entry(node.parent_id.clone())
                .or_default()
                .push(id.clone());
        }

        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        Ok(())
    }

    /// Insert an edge. Both endpoints must already exist; no dedup happens here.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        let from_idx = *self
            .node_indices
            .get(&edge.source)
            .ok_or_else(|| GraphError::NodeNotFound(edge.source.clone()))?;
        let to_idx = *self
            .node_indices
            .get(&edge.target)
            .ok_or_else(|| GraphError::NodeNotFound(edge.target.clone()))?;

        self.graph.add_edge(from_idx, to_idx, edge);
        Ok(())
    }

    /// Get a node by qualified ID
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices.get(id).map(|&idx| &self.graph[idx])
    }

    /// Whether a qualified ID is present
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes, sorted by ID
    #[must_use]
    pub fn nodes(&self) -> Vec<&GraphNode> {
        let mut nodes: Vec<_> = self.graph.node_weights().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All edges, sorted by (source, target)
    #[must_use]
    pub fn edges(&self) -> Vec<&GraphEdge> {
        let mut edges: Vec<_> = self.graph.edge_weights().collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        edges
    }

    /// Direct children of a node
    #[must_use]
    pub fn children(&self, id: &str) -> Vec<&GraphNode> {
        let mut nodes: Vec<_> = self
            .children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.node(child))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All nodes below a node in the hierarchy
    #[must_use]
    pub fn descendants(&self, id: &str) -> Vec<&GraphNode> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children.get(current).into_iter().flatten() {
                if let Some(node) = self.node(child) {
                    out.push(node);
                    queue.push_back(child);
                }
            }
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Parent chain of a node, nearest first
    #[must_use]
    pub fn ancestors(&self, id: &str) -> Vec<&GraphNode> {
        let mut out = Vec::new();
        let mut current = self.node(id);
        while let Some(node) = current {
            if node.parent_id.is_empty() {
                break;
            }
            current = self.node(&node.parent_id);
            if let Some(parent) = current {
                out.push(parent);
            }
        }
        out
    }

    /// Edges leaving a node, sorted by target
    #[must_use]
    pub fn outgoing_edges(&self, id: &str) -> Vec<&GraphEdge> {
        self.directed_edges(id, Direction::Outgoing)
    }

    /// Edges arriving at a node, sorted by source
    #[must_use]
    pub fn incoming_edges(&self, id: &str) -> Vec<&GraphEdge> {
        self.directed_edges(id, Direction::Incoming)
    }

    fn directed_edges(&self, id: &str, dir: Direction) -> Vec<&GraphEdge> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_directed(idx, dir).map(|e| e.weight()).collect();
        match dir {
            Direction::Outgoing => edges.sort_by(|a, b| a.target.cmp(&b.target)),
            Direction::Incoming => edges.sort_by(|a, b| a.source.cmp(&b.source)),
        }
        edges
    }

    /// Number of outgoing edges
    #[must_use]
    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    /// Number of incoming edges
    #[must_use]
    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    fn degree(&self, id: &str, dir: Direction) -> usize {
        self.node_indices
            .get(id)
            .map_or(0, |&idx| self.graph.edges_directed(idx, dir).count())
    }

    /// Nodes this node depends on
    #[must_use]
    pub fn dependencies(&self, id: &str) -> Vec<&GraphNode> {
        self.outgoing_edges(id)
            .into_iter()
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// Nodes that depend on this node
    #[must_use]
    pub fn dependents(&self, id: &str) -> Vec<&GraphNode> {
        self.incoming_edges(id)
            .into_iter()
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Nodes at a hierarchy level, sorted by ID
    #[must_use]
    pub fn nodes_by_level(&self, level: u8) -> Vec<&GraphNode> {
        let mut nodes: Vec<_> = self.graph.node_weights().filter(|n| n.level == level).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Qualified IDs sharing a short ID
    #[must_use]
    pub fn short_id_candidates(&self, short_id: &str) -> &[String] {
        self.short_ids.get(short_id).map_or(&[][..], Vec::as_slice)
    }

    /// Resolve a possibly-unqualified identifier to a qualified one.
    ///
    /// Exact qualified matches win; otherwise the short ID must name exactly
    /// one node.
    #[must_use]
    pub fn resolve_id(&self, candidate: &str) -> Option<String> {
        self.resolve_id_excluding(candidate, None)
    }

    /// Like [`resolve_id`](Self::resolve_id), but a short-ID match ignores
    /// `exclude` (normally the relationship's own source).
    #[must_use]
    pub fn resolve_id_excluding(&self, candidate: &str, exclude: Option<&str>) -> Option<String> {
        if self.contains(candidate) {
            return Some(candidate.to_string());
        }

        let mut remaining = self
            .short_id_candidates(candidate)
            .iter()
            .filter(|qid| Some(qid.as_str()) != exclude);
        match (remaining.next(), remaining.next()) {
            (Some(only), None) => Some(only.clone()),
            _ => None,
        }
    }

    /// Whether an identifier names any node, by qualified or short ID
    #[must_use]
    pub fn references_node(&self, candidate: &str) -> bool {
        self.contains(candidate) || !self.short_id_candidates(candidate).is_empty()
    }

    /// Check structural consistency: edge endpoints and parent links
    pub fn validate(&self) -> Result<()> {
        for edge in self.graph.edge_references() {
            let weight = edge.weight();
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            if source.id != weight.source || target.id != weight.target {
                return Err(GraphError::Validation(format!(
                    "edge {} ({} -> {}) is attached to {} -> {}",
                    weight.id, weight.source, weight.target, source.id, target.id
                )));
            }
        }

        for node in self.graph.node_weights() {
            if NodeKind::from_level(node.level) != Some(node.kind) {
                return Err(GraphError::Validation(format!(
                    "node {} has level {} but kind {}",
                    node.id, node.level, node.kind
                )));
            }
            if node.parent_id.is_empty() {
                if node.kind != NodeKind::System {
                    return Err(GraphError::Validation(format!(
                        "{} {} has no parent",
                        node.kind, node.id
                    )));
                }
                continue;
            }
            let parent = self.node(&node.parent_id).ok_or_else(|| {
                GraphError::Validation(format!(
                    "node {} references missing parent {}",
                    node.id, node.parent_id
                ))
            })?;
            if parent.level + 1 != node.level {
                return Err(GraphError::Validation(format!(
                    "node {} (level {}) has parent {} at level {}",
                    node.id, node.level, parent.id, parent.level
                )));
            }
        }

        Ok(())
    }

    /// Every node reachable by following dependencies, sorted by ID
    #[must_use]
    pub fn transitive_dependencies(&self, id: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing_edges(current) {
                if edge.target != id && seen.insert(&edge.target) {
                    queue.push_back(&edge.target);
                }
            }
        }
        let mut out: Vec<String> = seen.into_iter().map(String::from).collect();
        out.sort();
        out
    }

    /// Shortest dependency path from `from` to `to`, both ends included
    #[must_use]
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut previous: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing_edges(current) {
                let next = edge.target.as_str();
                if next == from || previous.contains_key(next) {
                    continue;
                }
                previous.insert(next, current);
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut step = to;
                    while let Some(&prev) = previous.get(step) {
                        path.push(prev.to_string());
                        step = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Export to DOT format for Graphviz, one cluster per system
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph architecture {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for system in self.nodes_by_level(NodeKind::System.level()) {
            let _ = writeln!(dot, "  subgraph \"cluster_{}\" {{", escape_dot(&system.id));
            let _ = writeln!(dot, "    label=\"{}\";", escape_dot(&system.name));
            dot.push_str("    style=dashed;\n");
            for node in self.descendants(&system.id) {
                let _ = writeln!(
                    dot,
                    "    \"{}\" [label=\"{}\\n[{}]\"];",
                    escape_dot(&node.id),
                    escape_dot(&node.name),
                    node.kind
                );
            }
            dot.push_str("  }\n");
        }

        dot.push('\n');

        for edge in self.edges() {
            let _ = writeln!(
                dot,
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                escape_dot(&edge.source),
                escape_dot(&edge.target),
                escape_dot(&edge.description)
            );
        }

        dot.push_str("}\n");
        dot
    }

    /// Export nodes and edges to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Export<'a> {
            nodes: Vec<&'a GraphNode>,
            edges: Vec<&'a GraphEdge>,
        }

        serde_json::to_string_pretty(&Export {
            nodes: self.nodes(),
            edges: self.edges(),
        })
    }
}

/// Extract the subgraph for one system: the system, its descendants and the
/// edges between them.
///
/// `system_id` may be a qualified system ID or the system's short ID.
pub fn system_graph(graph: &ArchitectureGraph, system_id: &str) -> Result<ArchitectureGraph> {
    if system_id.is_empty() {
        return Err(GraphError::InvalidInput("system ID must not be empty".into()));
    }

    let qid = match parse_qualified_id(system_id) {
        Some(parts) if parts.kind == NodeKind::System => system_id.to_string(),
        Some(_) => {
            return Err(GraphError::InvalidInput(format!(
                "{system_id} is not a system ID"
            )))
        }
        None => qualified_id(NodeKind::System, system_id, "", ""),
    };

    let system = graph
        .node(&qid)
        .ok_or_else(|| GraphError::NodeNotFound(system_id.to_string()))?;

    let mut members = vec![system];
    members.extend(graph.descendants(&qid));
    members.sort_by(|a, b| (a.level, &a.id).cmp(&(b.level, &b.id)));
    let member_ids: HashSet<&str> = members.iter().map(|n| n.id.as_str()).collect();

    let mut sub = ArchitectureGraph::new();
    for node in &members {
        sub.add_node((*node).clone())?;
    }
    for node in &members {
        for edge in graph.outgoing_edges(&node.id) {
            if member_ids.contains(edge.target.as_str()) {
                sub.add_edge(edge.clone())?;
            }
        }
    }

    sub.validate()?;
    Ok(sub)
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
