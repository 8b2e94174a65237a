// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Archgraph library - C4 architecture graph engine
//!
//! This crate turns a System → Container → Component entity tree, plus
//! optional per-component diagrams, into a queryable dependency graph, and
//! reports cycles, coupling, dangling references and drift over it.
//!
//! ```no_run
//! # async fn demo(tree: archgraph::entity::EntityTree) -> archgraph::error::Result<()> {
//! use archgraph::prelude::*;
//!
//! let graph = build_graph(&tree, None, &BuildOptions::default()).await?;
//! let report = validate_architecture(&graph, &tree);
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod cache;
pub mod commands;
pub mod config;
pub mod diagram;
pub mod drift;
pub mod entity;
pub mod error;
pub mod graph;
pub mod identity;
pub mod manifest;
pub mod report;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use builder::{build_graph, build_graph_with_stats, BuildOptions, BuildStats};
pub use drift::{detect_drift, DriftResult};
pub use graph::{system_graph, ArchitectureGraph, GraphEdge, GraphNode};
pub use report::{analyze_dependencies, DependencyReport};
pub use validator::{validate_architecture, ArchitectureReport};

/// Prelude for common imports
pub mod prelude {
    pub use crate::builder::{build_graph, build_graph_with_stats, BuildOptions, BuildStats};
    pub use crate::cache::GraphCache;
    pub use crate::diagram::{DiagramParser, DiagramRelationship, ParseContext};
    pub use crate::drift::{detect_drift, DriftIssue, DriftKind, DriftResult};
    pub use crate::entity::{Component, Container, Entity, EntityRef, EntityTree, System};
    pub use crate::error::{DiagramError, GraphError};
    pub use crate::graph::{system_graph, ArchitectureGraph, GraphEdge, GraphNode};
    pub use crate::identity::{parse_qualified_id, qualified_id, NodeKind, QualifiedParts};
    pub use crate::report::{analyze_dependencies, DependencyReport};
    pub use crate::validator::{
        validate_architecture, ArchitectureIssue, ArchitectureReport, IssueKind, Severity,
    };
}
