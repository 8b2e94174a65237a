// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Loading an entity tree from an `architecture.toml` manifest
//!
//! ```toml
//! [[systems]]
//! id = "shop"
//! name = "Shop"
//!
//! [[systems.containers]]
//! id = "api"
//! name = "API Server"
//!
//! [[systems.containers.components]]
//! id = "cart"
//! name = "Cart"
//! path = "components/cart"
//! relationships = { auth = "checks sessions" }
//! ```
//!
//! Relative component paths are resolved against the manifest's directory.

use crate::entity::EntityTree;
use crate::error::{GraphError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default manifest file name inside a project root
pub const MANIFEST_FILE: &str = "architecture.toml";

/// Parse a manifest from TOML text. Paths are left as written.
pub fn parse_manifest(text: &str) -> Result<EntityTree> {
    toml::from_str(text).map_err(|e| GraphError::InvalidInput(format!("invalid manifest: {e}")))
}

/// Load a manifest file and anchor relative component paths to its directory
pub fn load_manifest(path: &Path) -> Result<EntityTree> {
    let text = fs::read_to_string(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut tree = parse_manifest(&text)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for system in &mut tree.systems {
        for container in &mut system.containers {
            for component in &mut container.components {
                if let Some(dir) = component.path.as_mut() {
                    if dir.is_relative() {
                        *dir = base.join(&*dir);
                    }
                }
            }
        }
    }

    debug!(
        "Loaded {} entities from {}",
        tree.entity_count(),
        path.display()
    );
    Ok(tree)
}

/// Load `architecture.toml` from a project root
pub fn load_project(root: &Path) -> Result<EntityTree> {
    load_manifest(&root.join(MANIFEST_FILE))
}
