// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Diagram sources: the parser contract and diagram file lookup
//!
//! The engine does not understand any diagram language itself. It finds the
//! one diagram file in a component's directory, reads it and hands the text
//! to a [`DiagramParser`].

use crate::error::DiagramError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension of diagram files looked up in component directories
pub const DEFAULT_DIAGRAM_EXTENSION: &str = "d2";

/// A relationship tuple extracted from diagram text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRelationship {
    /// Raw source identifier as written in the diagram
    pub source: String,
    /// Raw target identifier as written in the diagram
    pub target: String,
    /// Edge label, may be empty
    pub label: String,
}

impl DiagramRelationship {
    /// Create a relationship tuple
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: label.into(),
        }
    }
}

/// Context passed along with each parse request
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Qualified ID of the component whose diagram is parsed
    pub component_id: String,
    /// Diagram file path
    pub path: PathBuf,
}

/// Turns diagram source text into relationship tuples.
///
/// Implementations must be pure with respect to the text; they are called
/// from blocking worker threads. A panic inside `parse_relationships` is
/// caught at the task boundary and counted as one failed diagram, which
/// relies on the binary being built with `panic = "unwind"`.
pub trait DiagramParser: Send + Sync {
    /// Parse relationships out of one diagram
    fn parse_relationships(
        &self,
        ctx: &ParseContext,
        source: &str,
    ) -> Result<Vec<DiagramRelationship>, DiagramError>;
}

/// Find the diagram file directly inside `dir`.
///
/// When several files match, the first by file name wins, so the choice is
/// stable across runs.
#[must_use]
pub fn find_diagram_file(dir: &Path, extension: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        })
        .map(walkdir::DirEntry::into_path)
}

/// Locate, read and parse the diagram of one component.
///
/// A directory without a diagram yields no relationships.
pub fn load_diagram_relationships(
    parser: &dyn DiagramParser,
    component_id: &str,
    dir: &Path,
    extension: &str,
) -> Result<Vec<DiagramRelationship>, DiagramError> {
    let Some(path) = find_diagram_file(dir, extension) else {
        debug!("No .{} diagram in {}", extension, dir.display());
        return Ok(Vec::new());
    };

    let text = fs::read_to_string(&path).map_err(|source| DiagramError::Read {
        path: path.clone(),
        source,
    })?;

    let ctx = ParseContext {
        component_id: component_id.to_string(),
        path,
    };
    parser.parse_relationships(&ctx, &text)
}

/// Minimal parser for `source -> target: label` lines.
///
/// Lines without an arrow (shape declarations, styles) and `#` comments are
/// skipped. Identifiers may be wrapped in double quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowParser;

impl DiagramParser for ArrowParser {
    fn parse_relationships(
        &self,
        _ctx: &ParseContext,
        source: &str,
    ) -> Result<Vec<DiagramRelationship>, DiagramError> {
        let mut out = Vec::new();
        for (i, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || !line.contains("->") {
                continue;
            }
            let incomplete = || DiagramError::Parse {
                line: i + 1,
                message: format!("incomplete relationship: {line}"),
            };

            let (from, rest) = split_ident(line, "->").ok_or_else(incomplete)?;
            // An arrow inside a label (`auth: a -> b`) is not a relationship
            let Some(rest) = rest.strip_prefix("->") else {
                continue;
            };
            let (to, rest) = split_ident(rest, ":").ok_or_else(incomplete)?;
            let label = rest.strip_prefix(':').map_or("", |l| unquote(l.trim()));

            if from.is_empty() || to.is_empty() {
                return Err(incomplete());
            }
            out.push(DiagramRelationship::new(from, to, label));
        }
        Ok(out)
    }
}

/// Split a leading identifier off `s`. A quoted identifier runs to its
/// closing quote; a bare one runs up to `delim`. Returns `None` for an
/// unterminated quote.
fn split_ident<'a>(s: &'a str, delim: &str) -> Option<(&'a str, &'a str)> {
    let s = s.trim_start();
    if let Some(body) = s.strip_prefix('"') {
        let end = body.find('"')?;
        return Some((&body[..end], body[end + 1..].trim_start()));
    }
    Some(match s.find(delim) {
        Some(at) => (s[..at].trim_end(), &s[at..]),
        None => (s.trim_end(), ""),
    })
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}
