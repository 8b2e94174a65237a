// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for graph construction and queries

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the architecture graph engine.
///
/// Data-quality findings (cycles, dangling references, drift) are never
/// errors; they are reported as issues. Only broken preconditions and
/// structural bugs in construction end up here.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A caller passed input the engine cannot work with
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two nodes derived the same qualified ID
    #[error("node already exists: {0}")]
    DuplicateNode(String),

    /// A query or edge referenced an unknown node
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The finished graph is structurally inconsistent
    #[error("graph validation failed: {0}")]
    Validation(String),

    /// Reading an input file failed
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors from locating, reading or parsing a component's diagram.
///
/// These never escape the builder: a failing component simply contributes
/// no diagram edges.
#[derive(Debug, Error)]
pub enum DiagramError {
    /// The diagram file could not be read
    #[error("failed to read diagram {path}: {source}")]
    Read {
        /// Diagram path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The diagram text was rejected by the parser
    #[error("failed to parse diagram at line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },

    /// The parsing task did not complete
    #[error("diagram task aborted: {0}")]
    Task(String),
}

/// Result alias for graph operations
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
