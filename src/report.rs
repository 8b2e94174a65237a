// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency statistics for a built graph

use crate::graph::ArchitectureGraph;
use crate::identity::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A component with more outgoing edges than this is highly coupled.
/// Deliberately lower than the validator's warning threshold.
pub const COUPLING_REPORT_THRESHOLD: usize = 2;

/// A component with more incoming edges than this is central
pub const CENTRALITY_THRESHOLD: usize = 2;

/// Aggregate dependency statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    /// Number of systems
    pub systems_count: usize,
    /// Number of containers
    pub containers_count: usize,
    /// Number of components
    pub components_count: usize,
    /// All nodes
    pub total_nodes: usize,
    /// All edges
    pub total_edges: usize,
    /// Components without any edge, sorted
    pub isolated_components: Vec<String>,
    /// Component → outgoing edge count, above [`COUPLING_REPORT_THRESHOLD`]
    pub highly_coupled_components: BTreeMap<String, usize>,
    /// Component → incoming edge count, above [`CENTRALITY_THRESHOLD`]
    pub central_components: BTreeMap<String, usize>,
}

/// Compute dependency statistics over component-level nodes
#[must_use]
pub fn analyze_dependencies(graph: &ArchitectureGraph) -> DependencyReport {
    let mut report = DependencyReport {
        systems_count: graph.nodes_by_level(NodeKind::System.level()).len(),
        containers_count: graph.nodes_by_level(NodeKind::Container.level()).len(),
        total_nodes: graph.node_count(),
        total_edges: graph.edge_count(),
        ..Default::default()
    };

    for node in graph.nodes_by_level(NodeKind::Component.level()) {
        report.components_count += 1;
        let outgoing = graph.out_degree(&node.id);
        let incoming = graph.in_degree(&node.id);

        if outgoing == 0 && incoming == 0 {
            report.isolated_components.push(node.id.clone());
        }
        if outgoing > COUPLING_REPORT_THRESHOLD {
            report.highly_coupled_components.insert(node.id.clone(), outgoing);
        }
        if incoming > CENTRALITY_THRESHOLD {
            report.central_components.insert(node.id.clone(), incoming);
        }
    }

    report
}
