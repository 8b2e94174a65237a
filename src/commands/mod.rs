// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod build;
pub mod completions;
pub mod deps;
pub mod drift;
pub mod export;
pub mod query;
pub mod system;
pub mod validate;

use crate::builder::{build_graph_with_stats, BuildStats};
use crate::config::Config;
use crate::diagram::{ArrowParser, DiagramParser};
use crate::entity::EntityTree;
use crate::graph::ArchitectureGraph;
use crate::manifest;
use crate::validator::Severity;
use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Project root holding `architecture.toml`
    pub root: PathBuf,
    /// Explicit manifest path, overriding `<root>/architecture.toml`
    pub manifest: Option<PathBuf>,
    /// Effective configuration
    pub config: Config,
    /// Emit JSON instead of text
    pub json: bool,
    /// Colourise text output
    pub color: bool,
    /// Merge relationships from diagram files
    pub diagrams: bool,
}

impl Context {
    /// Load the entity tree for this project
    pub fn load_tree(&self) -> Result<EntityTree> {
        let path = self
            .manifest
            .clone()
            .unwrap_or_else(|| self.root.join(manifest::MANIFEST_FILE));
        manifest::load_manifest(&path)
            .with_context(|| format!("Failed to load architecture from {}", path.display()))
    }

    /// Diagram parser to use, if diagrams are enabled
    #[must_use]
    pub fn parser(&self) -> Option<Arc<dyn DiagramParser>> {
        self.diagrams
            .then(|| Arc::new(ArrowParser) as Arc<dyn DiagramParser>)
    }

    /// Load the tree and build its graph
    pub async fn load_graph(&self) -> Result<(EntityTree, ArchitectureGraph, BuildStats)> {
        let tree = self.load_tree()?;
        let (graph, stats) = build_graph_with_stats(&tree, self.parser(), &self.config.build_options())
            .await
            .context("Failed to build architecture graph")?;
        Ok((tree, graph, stats))
    }

    /// Severity label, coloured when enabled
    #[must_use]
    pub fn severity_label(&self, severity: Severity) -> String {
        let label = format!("{severity:>7}");
        if !self.color {
            return label;
        }
        match severity {
            Severity::Error => label.red().bold().to_string(),
            Severity::Warning => label.yellow().to_string(),
            Severity::Info => label.blue().to_string(),
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
