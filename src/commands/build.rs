// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Build command - constructs the graph and prints a summary

use super::{print_json, Context};
use crate::builder::BuildStats;
use crate::identity::NodeKind;
use anyhow::Result;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct BuildSummary {
    nodes: usize,
    edges: usize,
    systems: usize,
    containers: usize,
    components: usize,
    stats: BuildStats,
}

/// Run the build command
pub async fn run(ctx: &Context) -> Result<()> {
    info!("Building architecture graph for {}", ctx.root.display());
    let (_, graph, stats) = ctx.load_graph().await?;

    let summary = BuildSummary {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        systems: graph.nodes_by_level(NodeKind::System.level()).len(),
        containers: graph.nodes_by_level(NodeKind::Container.level()).len(),
        components: graph.nodes_by_level(NodeKind::Component.level()).len(),
        stats,
    };

    if ctx.json {
        return print_json(&summary);
    }

    println!(
        "Built graph: {} nodes ({} systems, {} containers, {} components), {} edges",
        summary.nodes, summary.systems, summary.containers, summary.components, summary.edges
    );
    println!("  declared edges:     {}", summary.stats.declared_edges);
    println!("  diagram edges:      {}", summary.stats.diagram_edges);
    println!("  duplicates dropped: {}", summary.stats.duplicates_dropped);
    println!("  unresolved targets: {}", summary.stats.unresolved);
    if summary.stats.skipped_entities > 0 {
        eprintln!(
            "  Warning: {} entities skipped for empty IDs",
            summary.stats.skipped_entities
        );
    }
    if summary.stats.diagram_failures > 0 {
        eprintln!(
            "  Warning: {} diagram(s) could not be read or parsed",
            summary.stats.diagram_failures
        );
    }

    Ok(())
}
