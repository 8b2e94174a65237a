// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Architecture validation: cycles, isolation, coupling, dangling references

use crate::entity::EntityTree;
use crate::graph::ArchitectureGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Outgoing-edge count at which a node is flagged as highly coupled
pub const HIGH_COUPLING_THRESHOLD: usize = 5;

/// How serious a reported issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Breaks the architecture's consistency
    Error,
    /// Worth a look
    Warning,
    /// Informational
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        })
    }
}

/// Category of an architecture issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Nodes depend on each other in a loop
    CircularDependency,
    /// Nodes with no edges at all
    IsolatedComponent,
    /// Nodes with many outgoing dependencies
    HighCoupling,
    /// Declared relationships to entities that do not exist
    DanglingReference,
}

impl IssueKind {
    /// Snake-case name, as serialized
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CircularDependency => "circular_dependency",
            Self::IsolatedComponent => "isolated_component",
            Self::HighCoupling => "high_coupling",
            Self::DanglingReference => "dangling_reference",
        }
    }
}

/// One finding of [`validate_architecture`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureIssue {
    /// Issue category
    pub kind: IssueKind,
    /// Severity
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Affected node IDs; for cycles, the ordered cycle path
    pub nodes: Vec<String>,
    /// Unresolvable relationship targets (dangling references only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,
}

/// Result of validating an architecture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureReport {
    /// All findings, grouped by check
    pub issues: Vec<ArchitectureIssue>,
    /// True when there are no errors
    pub is_valid: bool,
    /// Number of error issues
    pub error_count: usize,
    /// Number of warning issues
    pub warning_count: usize,
    /// Number of info issues
    pub info_count: usize,
    /// One-line summary
    pub summary: String,
}

impl ArchitectureReport {
    fn from_issues(issues: Vec<ArchitectureIssue>) -> Self {
        let count = |s: Severity| issues.iter().filter(|i| i.severity == s).count();
        let error_count = count(Severity::Error);
        let warning_count = count(Severity::Warning);
        let info_count = count(Severity::Info);

        let summary = if issues.is_empty() {
            "No architecture issues found".to_string()
        } else {
            format!(
                "{} issue(s): {} error(s), {} warning(s), {} info",
                issues.len(),
                error_count,
                warning_count,
                info_count
            )
        };

        Self {
            issues,
            is_valid: error_count == 0,
            error_count,
            warning_count,
            info_count,
            summary,
        }
    }

    /// Issues of one kind
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ArchitectureIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

/// Run all architecture checks over a built graph and its entity tree
#[must_use]
pub fn validate_architecture(graph: &ArchitectureGraph, tree: &EntityTree) -> ArchitectureReport {
    let mut issues = Vec::new();
    issues.extend(check_cycles(graph));
    issues.extend(check_isolated(graph));
    issues.extend(check_coupling(graph));
    issues.extend(check_dangling(graph, tree));

    let report = ArchitectureReport::from_issues(issues);
    debug!("Validation finished: {}", report.summary);
    report
}

fn check_cycles(graph: &ArchitectureGraph) -> Vec<ArchitectureIssue> {
    find_cycles(graph)
        .into_iter()
        .map(|cycle| {
            let mut shown = cycle.clone();
            if let Some(first) = cycle.first() {
                shown.push(first.clone());
            }
            ArchitectureIssue {
                kind: IssueKind::CircularDependency,
                severity: Severity::Error,
                message: format!("Circular dependency: {}", shown.join(" -> ")),
                nodes: cycle,
                targets: Vec::new(),
            }
        })
        .collect()
}

/// Stack frame of the iterative depth-first search
struct Frame<'a> {
    targets: Vec<&'a str>,
    next: usize,
}

/// Depth-first search from every unvisited node. Each edge back into the
/// current recursion stack closes one cycle.
fn find_cycles(graph: &ArchitectureGraph) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashMap<&str, usize> = HashMap::new();
    let mut path: Vec<&str> = Vec::new();
    let mut frames: Vec<Frame<'_>> = Vec::new();

    for start in graph.nodes() {
        if visited.contains(start.id.as_str()) {
            continue;
        }

        push_frame(graph, &start.id, &mut visited, &mut on_stack, &mut path, &mut frames);

        while let Some(frame) = frames.last_mut() {
            if frame.next < frame.targets.len() {
                let next = frame.targets[frame.next];
                frame.next += 1;

                if let Some(&pos) = on_stack.get(next) {
                    cycles.push(path[pos..].iter().map(|s| (*s).to_string()).collect());
                } else if !visited.contains(next) {
                    push_frame(graph, next, &mut visited, &mut on_stack, &mut path, &mut frames);
                }
            } else {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_stack.remove(done);
                }
            }
        }
    }

    cycles
}

fn push_frame<'a>(
    graph: &'a ArchitectureGraph,
    id: &'a str,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashMap<&'a str, usize>,
    path: &mut Vec<&'a str>,
    frames: &mut Vec<Frame<'a>>,
) {
    visited.insert(id);
    on_stack.insert(id, path.len());
    path.push(id);
    frames.push(Frame {
        targets: graph
            .outgoing_edges(id)
            .into_iter()
            .map(|e| e.target.as_str())
            .collect(),
        next: 0,
    });
}

fn check_isolated(graph: &ArchitectureGraph) -> Option<ArchitectureIssue> {
    // Every node is considered, including systems and containers
    let isolated: Vec<String> = graph
        .nodes()
        .into_iter()
        .filter(|n| graph.in_degree(&n.id) == 0 && graph.out_degree(&n.id) == 0)
        .map(|n| n.id.clone())
        .collect();

    if isolated.is_empty() {
        return None;
    }
    Some(ArchitectureIssue {
        kind: IssueKind::IsolatedComponent,
        severity: Severity::Info,
        message: format!("{} node(s) have no relationships", isolated.len()),
        nodes: isolated,
        targets: Vec::new(),
    })
}

fn check_coupling(graph: &ArchitectureGraph) -> Option<ArchitectureIssue> {
    let coupled: Vec<String> = graph
        .nodes()
        .into_iter()
        .filter(|n| graph.out_degree(&n.id) >= HIGH_COUPLING_THRESHOLD)
        .map(|n| n.id.clone())
        .collect();

    if coupled.is_empty() {
        return None;
    }
    Some(ArchitectureIssue {
        kind: IssueKind::HighCoupling,
        severity: Severity::Warning,
        message: format!(
            "{} node(s) have {} or more dependencies",
            coupled.len(),
            HIGH_COUPLING_THRESHOLD
        ),
        nodes: coupled,
        targets: Vec::new(),
    })
}

fn check_dangling(graph: &ArchitectureGraph, tree: &EntityTree) -> Vec<ArchitectureIssue> {
    let mut issues: Vec<ArchitectureIssue> = tree
        .components()
        .filter_map(|entry| {
            let missing: Vec<String> = entry
                .component
                .relationships
                .keys()
                .filter(|target| !graph.references_node(target))
                .cloned()
                .collect();
            if missing.is_empty() {
                return None;
            }
            let source = entry.qualified_id();
            Some(ArchitectureIssue {
                kind: IssueKind::DanglingReference,
                severity: Severity::Error,
                message: format!(
                    "{} references unknown target(s): {}",
                    source,
                    missing.join(", ")
                ),
                nodes: vec![source],
                targets: missing,
            })
        })
        .collect();
    issues.sort_by(|a, b| a.nodes.cmp(&b.nodes));
    issues
}
