// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Deps command - aggregate dependency statistics

use super::{print_json, Context};
use crate::report::analyze_dependencies;
use anyhow::Result;

/// Run the deps command
pub async fn run(ctx: &Context) -> Result<()> {
    let (_, graph, _) = ctx.load_graph().await?;
    let report = analyze_dependencies(&graph);

    if ctx.json {
        return print_json(&report);
    }

    println!("Systems:    {}", report.systems_count);
    println!("Containers: {}", report.containers_count);
    println!("Components: {}", report.components_count);
    println!("Nodes:      {}", report.total_nodes);
    println!("Edges:      {}", report.total_edges);

    if !report.isolated_components.is_empty() {
        println!();
        println!("Isolated components ({}):", report.isolated_components.len());
        for id in &report.isolated_components {
            println!("  {id}");
        }
    }
    if !report.highly_coupled_components.is_empty() {
        println!();
        println!("Highly coupled components:");
        for (id, count) in &report.highly_coupled_components {
            println!("  {id} ({count} dependencies)");
        }
    }
    if !report.central_components.is_empty() {
        println!();
        println!("Central components:");
        for (id, count) in &report.central_components {
            println!("  {id} ({count} dependents)");
        }
    }

    Ok(())
}
