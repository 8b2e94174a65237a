// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Drift command - declared relationships versus the known entities

use super::{print_json, Context};
use crate::drift::detect_drift;
use anyhow::Result;

/// Run the drift command. Fails when error-level drift is found.
pub fn run(ctx: &Context) -> Result<()> {
    let tree = ctx.load_tree()?;
    let parser = ctx.parser();
    let result = detect_drift(&tree, parser.as_deref(), &ctx.config.diagram_extension);

    if ctx.json {
        print_json(&result)?;
    } else if result.issues.is_empty() {
        println!("No drift detected ({} components checked)", result.components_checked);
    } else {
        for issue in &result.issues {
            println!("{} {}", ctx.severity_label(issue.severity), issue.message);
        }
        println!();
        println!(
            "{} drift issue(s) across {} components",
            result.issues.len(),
            result.components_checked
        );
    }

    if result.has_errors {
        anyhow::bail!("drift detected");
    }
    Ok(())
}
