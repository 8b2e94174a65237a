// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - exports the architecture graph to various formats

use super::Context;
use crate::graph::system_graph;
use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON format
    Json,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Some(Self::Dot),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub async fn run(
    ctx: &Context,
    format: &str,
    output: Option<PathBuf>,
    system: Option<String>,
) -> Result<()> {
    info!("Exporting to {}", format);

    let export_format = ExportFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown export format: {format}. Supported: dot, json"))?;

    let (_, mut graph, _) = ctx.load_graph().await?;

    if graph.is_empty() {
        eprintln!("Warning: Graph is empty. Declare systems in architecture.toml first.");
    }

    if let Some(ref system_id) = system {
        info!("Restricting export to system: {}", system_id);
        graph = system_graph(&graph, system_id)
            .with_context(|| format!("Failed to extract system {system_id}"))?;
    }

    let content = match export_format {
        ExportFormat::Dot => graph.to_dot(),
        ExportFormat::Json => graph.to_json()?,
    };

    match output {
        Some(mut path) => {
            if path.extension().is_none() {
                path.set_extension(export_format.extension());
            }
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::parse("DOT"), Some(ExportFormat::Dot));
        assert_eq!(ExportFormat::parse("graphviz"), Some(ExportFormat::Dot));
        assert_eq!(ExportFormat::parse("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse("yaml"), None);
        assert_eq!(ExportFormat::Json.extension(), "json");
    }
}
