// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Cache of built graphs, keyed by project root
//!
//! A built graph never observes changes to the entities it came from.
//! Whoever edits a project must call [`GraphCache::invalidate`] for its root.

use crate::graph::ArchitectureGraph;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Shared cache of built graphs
#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: RwLock<HashMap<PathBuf, Arc<ArchitectureGraph>>>,
}

impl GraphCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached graph for a project root
    #[must_use]
    pub fn get(&self, root: &Path) -> Option<Arc<ArchitectureGraph>> {
        self.graphs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(root)
            .cloned()
    }

    /// Store a graph for a project root, replacing any previous one
    pub fn set(&self, root: impl Into<PathBuf>, graph: ArchitectureGraph) -> Arc<ArchitectureGraph> {
        let root = root.into();
        let graph = Arc::new(graph);
        debug!("Caching graph for {}", root.display());
        self.graphs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root, Arc::clone(&graph));
        graph
    }

    /// Drop the graph for a project root. Returns whether one was cached.
    pub fn invalidate(&self, root: &Path) -> bool {
        let removed = self
            .graphs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(root)
            .is_some();
        if removed {
            debug!("Invalidated cached graph for {}", root.display());
        }
        removed
    }

    /// Drop every cached graph
    pub fn clear(&self) {
        self.graphs.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of cached projects
    #[must_use]
    pub fn len(&self) -> usize {
        self.graphs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityRef;
    use crate::graph::GraphNode;

    fn graph_with(system: &str) -> ArchitectureGraph {
        let mut graph = ArchitectureGraph::new();
        graph
            .add_node(GraphNode::new(
                EntityRef::System {
                    system: system.into(),
                },
                system,
                "",
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_get_set_invalidate() {
        let cache = GraphCache::new();
        let root = Path::new("/projects/shop");
        assert!(cache.get(root).is_none());

        cache.set(root, graph_with("shop"));
        let cached = cache.get(root).unwrap();
        assert!(cached.contains("system:shop"));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(root));
        assert!(!cache.invalidate(root));
        assert!(cache.get(root).is_none());
        // Readers holding the old graph keep it
        assert_eq!(cached.node_count(), 1);
    }

    #[test]
    fn test_roots_are_independent() {
        let cache = GraphCache::new();
        cache.set("/a", graph_with("a"));
        cache.set("/b", graph_with("b"));

        cache.invalidate(Path::new("/a"));
        assert!(cache.get(Path::new("/a")).is_none());
        assert!(cache.get(Path::new("/b")).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_replaces() {
        let cache = GraphCache::new();
        cache.set("/p", graph_with("old"));
        cache.set("/p", graph_with("new"));
        let cached = cache.get(Path::new("/p")).unwrap();
        assert!(cached.contains("system:new"));
        assert!(!cached.contains("system:old"));
    }
}
