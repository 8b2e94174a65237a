// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Drift detection between declared metadata and the rest of the project
//!
//! Unlike the validator, drift detection works on the entity tree alone and
//! needs no built graph.

use crate::diagram::{load_diagram_relationships, DiagramParser};
use crate::entity::{ComponentEntry, EntityTree};
use crate::validator::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Category of a drift finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum DriftKind {
    /// A declared relationship names a component that does not exist
    OrphanedRelationship,
}

impl DriftKind {
    /// Severity reported for this kind
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            Self::OrphanedRelationship => Severity::Error,
        }
    }
}

/// One drift finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftIssue {
    /// Drift category
    pub kind: DriftKind,
    /// Severity
    pub severity: Severity,
    /// Qualified ID of the component the finding belongs to
    pub component: String,
    /// Relationship target involved
    pub target: String,
    /// Human-readable description
    pub message: String,
}

/// Result of a drift check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftResult {
    /// Findings sorted by component, then target
    pub issues: Vec<DriftIssue>,
    /// Any error-level finding
    pub has_errors: bool,
    /// Any warning-level finding
    pub has_warnings: bool,
    /// Number of components inspected
    pub components_checked: usize,
}

/// Compare declared relationships against the entity set and, with a
/// parser, against each component's diagram.
#[must_use]
pub fn detect_drift(
    tree: &EntityTree,
    parser: Option<&dyn DiagramParser>,
    diagram_extension: &str,
) -> DriftResult {
    let known: HashSet<&str> = tree.components().map(|e| e.component.id.as_str()).collect();

    let mut issues = Vec::new();
    let mut components_checked = 0;
    for entry in tree.components() {
        components_checked += 1;
        issues.extend(check_orphaned(&entry, &known));
        if let Some(parser) = parser {
            issues.extend(check_missing_components(&entry, parser, diagram_extension));
        }
    }
    issues.sort_by(|a, b| (&a.component, &a.target).cmp(&(&b.component, &b.target)));

    let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
    let has_warnings = issues.iter().any(|i| i.severity == Severity::Warning);
    debug!(
        "Drift check: {} component(s), {} issue(s)",
        components_checked,
        issues.len()
    );

    DriftResult {
        issues,
        has_errors,
        has_warnings,
        components_checked,
    }
}

/// Targets must match some component's short ID somewhere in the tree
fn check_orphaned(entry: &ComponentEntry<'_>, known: &HashSet<&str>) -> Vec<DriftIssue> {
    let component = entry.qualified_id();
    entry
        .component
        .relationships
        .keys()
        .filter(|target| !known.contains(target.as_str()))
        .map(|target| {
            let kind = DriftKind::OrphanedRelationship;
            DriftIssue {
                kind,
                severity: kind.severity(),
                message: format!(
                    "{} declares a relationship to {}, which is not a known component",
                    component, target
                ),
                component: component.clone(),
                target: target.clone(),
            }
        })
        .collect()
}

/// Parses the component's diagram. Comparing diagram-only relationships
/// with declared metadata is not implemented, so nothing is reported.
fn check_missing_components(
    entry: &ComponentEntry<'_>,
    parser: &dyn DiagramParser,
    diagram_extension: &str,
) -> Vec<DriftIssue> {
    let Some(dir) = &entry.component.path else {
        return Vec::new();
    };
    let component = entry.qualified_id();
    match load_diagram_relationships(parser, &component, dir, diagram_extension) {
        Ok(relationships) => debug!(
            "{}: {} diagram relationship(s) parsed",
            component,
            relationships.len()
        ),
        Err(e) => debug!("{}: diagram skipped: {}", component, e),
    }
    Vec::new()
}
