// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Archgraph CLI - C4 architecture graphs from a declared entity tree

use anyhow::Result;
use archgraph::commands::{self, Context};
use archgraph::config;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "ARCHGRAPH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Project root containing architecture.toml
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Architecture manifest (defaults to <root>/architecture.toml)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Ignore per-component diagram files
    #[arg(long, global = true)]
    no_diagrams: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the architecture graph and print a summary
    Build,

    /// Check for cycles, isolated nodes, high coupling and dangling references
    Validate,

    /// Compare declared relationships against known components
    Drift,

    /// Report dependency statistics for components
    Deps,

    /// Show the subgraph of one system
    System {
        /// System ID (short or qualified)
        id: String,
    },

    /// Inspect a node and its dependencies
    Query {
        /// Node ID (qualified, or an unambiguous short ID)
        id: String,

        /// Include transitive dependencies
        #[arg(long)]
        transitive: bool,

        /// Find a dependency path to this node
        #[arg(long)]
        to: Option<String>,
    },

    /// Export graph to various formats
    Export {
        /// Output format (dot, json)
        #[arg(short, long, default_value = "dot")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Restrict to one system
        #[arg(long)]
        system: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        return commands::completions::run(shell, &mut Cli::command());
    }

    let config = config::load(&cli.root, cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins, then -v/-q, then the configured level
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context {
        root: cli.root,
        manifest: cli.manifest,
        config,
        json: cli.json,
        color: !cli.no_color,
        diagrams: !cli.no_diagrams,
    };

    match cli.command {
        Commands::Build => commands::build::run(&ctx).await,
        Commands::Validate => commands::validate::run(&ctx).await,
        Commands::Drift => commands::drift::run(&ctx),
        Commands::Deps => commands::deps::run(&ctx).await,
        Commands::System { id } => commands::system::run(&ctx, &id).await,
        Commands::Query { id, transitive, to } => {
            commands::query::run(&ctx, &id, transitive, to).await
        }
        Commands::Export { format, output, system } => {
            commands::export::run(&ctx, &format, output, system).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
