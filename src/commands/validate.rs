// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Validate command - cycles, isolation, coupling and dangling references

use super::{print_json, Context};
use crate::validator::validate_architecture;
use anyhow::Result;

/// Run the validate command. Fails when the architecture has errors.
pub async fn run(ctx: &Context) -> Result<()> {
    let (tree, graph, _) = ctx.load_graph().await?;
    let report = validate_architecture(&graph, &tree);

    if ctx.json {
        print_json(&report)?;
    } else {
        for issue in &report.issues {
            println!(
                "{} [{}] {}",
                ctx.severity_label(issue.severity),
                issue.kind.as_str(),
                issue.message
            );
            for node in &issue.nodes {
                println!("          - {node}");
            }
        }
        println!();
        println!("{}", report.summary);
    }

    if !report.is_valid {
        anyhow::bail!("architecture has {} error(s)", report.error_count);
    }
    Ok(())
}
