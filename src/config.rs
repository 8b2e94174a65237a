// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then the user's
//! `config.toml` in the platform config directory, then `archgraph.toml` in
//! the project root, then an explicit `--config` file, then `ARCHGRAPH_*`
//! environment variables.

use crate::builder::{BuildOptions, DEFAULT_MAX_CONCURRENT_PARSES};
use crate::diagram::DEFAULT_DIAGRAM_EXTENSION;
use ::config as cfg;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project settings file
pub const PROJECT_CONFIG_FILE: &str = "archgraph.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upper bound on concurrently parsed diagrams
    pub max_concurrent_parses: usize,
    /// Extension of per-component diagram files
    pub diagram_extension: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_parses: DEFAULT_MAX_CONCURRENT_PARSES,
            diagram_extension: DEFAULT_DIAGRAM_EXTENSION.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Graph construction options derived from these settings
    #[must_use]
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            max_concurrent_parses: self.max_concurrent_parses,
            diagram_extension: self.diagram_extension.clone(),
        }
    }
}

/// Name of the per-user settings file inside the platform config directory
pub const USER_CONFIG_FILE: &str = "config.toml";

/// Per-user settings file, e.g. `~/.config/archgraph/config.toml` on Linux
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "archgraph")
        .map(|dirs| dirs.config_dir().join(USER_CONFIG_FILE))
}

/// Load configuration for a project, layering file and environment sources
/// over the defaults
pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Config> {
    load_layers(user_config_file().as_deref(), project_root, explicit)
}

fn load_layers(user: Option<&Path>, project_root: &Path, explicit: Option<&Path>) -> Result<Config> {
    let defaults = cfg::Config::try_from(&Config::default()).context("encoding default configuration")?;

    let mut builder = cfg::Config::builder().add_source(defaults);
    if let Some(path) = user {
        debug!("User configuration: {}", path.display());
        builder = builder.add_source(
            cfg::File::from(path.to_path_buf())
                .format(cfg::FileFormat::Toml)
                .required(false),
        );
    }
    builder = builder.add_source(cfg::File::from(project_root.join(PROJECT_CONFIG_FILE)).required(false));

    if let Some(path) = explicit {
        builder = builder.add_source(
            cfg::File::from(path.to_path_buf())
                .format(cfg::FileFormat::Toml)
                .required(true),
        );
    }

    let config: Config = builder
        .add_source(cfg::Environment::with_prefix("ARCHGRAPH").try_parsing(true))
        .build()
        .context("building configuration")?
        .try_deserialize()
        .context("deserializing configuration")?;

    if config.max_concurrent_parses == 0 {
        anyhow::bail!("max_concurrent_parses must be at least 1");
    }
    Ok(config)
}
