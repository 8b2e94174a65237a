// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Query command - inspect one node and its neighbourhood

use super::{print_json, Context};
use crate::graph::{ArchitectureGraph, GraphNode};
use crate::identity::is_qualified;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct NodeReport<'a> {
    node: &'a GraphNode,
    ancestors: Vec<&'a str>,
    children: Vec<&'a str>,
    dependencies: Vec<&'a str>,
    dependents: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transitive: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<Option<Vec<String>>>,
}

fn ids(nodes: Vec<&GraphNode>) -> Vec<&str> {
    nodes.into_iter().map(|n| n.id.as_str()).collect()
}

/// Resolve a node by qualified ID or unambiguous short ID
fn lookup(graph: &ArchitectureGraph, id: &str) -> Result<String> {
    if graph.contains(id) {
        return Ok(id.to_string());
    }
    if is_qualified(id) {
        anyhow::bail!("Node not found: {id}");
    }
    match graph.short_id_candidates(id) {
        [] => anyhow::bail!("Node not found: {id}"),
        [only] => Ok(only.clone()),
        many => anyhow::bail!("Ambiguous ID {id}, candidates: {}", many.join(", ")),
    }
}

/// Run the query command
pub async fn run(ctx: &Context, id: &str, transitive: bool, to: Option<String>) -> Result<()> {
    let (_, graph, _) = ctx.load_graph().await?;
    let id = lookup(&graph, id)?;
    let target = to.as_deref().map(|t| lookup(&graph, t)).transpose()?;

    let Some(node) = graph.node(&id) else {
        anyhow::bail!("Node not found: {id}");
    };

    let report = NodeReport {
        node,
        ancestors: ids(graph.ancestors(&id)),
        children: ids(graph.children(&id)),
        dependencies: ids(graph.dependencies(&id)),
        dependents: ids(graph.dependents(&id)),
        transitive: transitive.then(|| graph.transitive_dependencies(&id)),
        path: target.as_deref().map(|t| graph.find_path(&id, t)),
    };

    if ctx.json {
        return print_json(&report);
    }

    println!("{} [{}]", node.id, node.kind);
    println!("  name: {}", node.name);
    if !node.description.is_empty() {
        println!("  description: {}", node.description);
    }
    for (key, value) in &node.metadata {
        println!("  {key}: {value}");
    }
    print_list("Ancestors", &report.ancestors);
    print_list("Children", &report.children);
    print_list("Depends on", &report.dependencies);
    print_list("Used by", &report.dependents);
    if let Some(ref all) = report.transitive {
        let all: Vec<&str> = all.iter().map(String::as_str).collect();
        print_list("Transitive dependencies", &all);
    }
    if let (Some(target), Some(path)) = (target, &report.path) {
        match path {
            Some(hops) => println!("Path to {target}: {}", hops.join(" -> ")),
            None => println!("No path to {target}"),
        }
    }
    Ok(())
}

fn print_list(title: &str, items: &[&str]) {
    if items.is_empty() {
        return;
    }
    println!("{title}:");
    for item in items {
        println!("  {item}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_graph, BuildOptions};
    use crate::test_support::{component, flat_id, flat_tree};

    #[tokio::test]
    async fn test_lookup_short_and_qualified() {
        let tree = flat_tree(vec![component("api", &[("db", "reads")]), component("db", &[])]);
        let graph = build_graph(&tree, None, &BuildOptions::default()).await.unwrap();

        assert_eq!(lookup(&graph, "api").unwrap(), flat_id("api"));
        assert_eq!(lookup(&graph, &flat_id("db")).unwrap(), flat_id("db"));
        assert!(lookup(&graph, "missing").is_err());
        assert!(lookup(&graph, &flat_id("missing")).is_err());
    }
}
