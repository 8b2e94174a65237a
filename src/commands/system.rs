// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! System command - show the subgraph of a single system

use super::{print_json, Context};
use crate::graph::{system_graph, GraphNode};
use crate::identity::NodeKind;
use anyhow::{Context as _, Result};

/// Run the system command
pub async fn run(ctx: &Context, system_id: &str) -> Result<()> {
    let (_, graph, _) = ctx.load_graph().await?;
    let sub = system_graph(&graph, system_id)
        .with_context(|| format!("Failed to extract system {system_id}"))?;

    if ctx.json {
        let nodes = sub.nodes();
        let edges = sub.edges();
        return print_json(&serde_json::json!({ "nodes": nodes, "edges": edges }));
    }

    // Depth-first over the hierarchy so containers list their components
    let mut stack: Vec<&GraphNode> = sub.nodes_by_level(NodeKind::System.level());
    while let Some(node) = stack.pop() {
        let indent = "  ".repeat(usize::from(node.level.saturating_sub(1)));
        println!("{indent}{} [{}] {}", node.name, node.kind, node.id);
        stack.extend(sub.children(&node.id).into_iter().rev());
    }
    let edges = sub.edges();
    if !edges.is_empty() {
        println!();
        println!("Dependencies ({}):", edges.len());
        for edge in edges {
            println!("  {} -> {}", edge.source, edge.target);
        }
    }
    Ok(())
}
