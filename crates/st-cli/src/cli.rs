//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Screen-time analyzer.
///
/// Ingests periodic text exports of per-app usage counters from one or more
/// devices and reconstructs a deduplicated timeline of usage intervals.
#[derive(Debug, Parser)]
#[command(name = "st", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the data directory for new exports and ingest them.
    Ingest,

    /// Show per-device snapshot and interval counts.
    Status,

    /// Report aggregated usage.
    Report {
        /// Restrict the report to one device.
        #[arg(long)]
        device: Option<String>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Manage app categories and display aliases.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

/// Category management actions.
#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// List all category mappings.
    List,

    /// Set the category (and optional alias) for an app.
    Set {
        /// Raw app name as it appears in exports.
        app: String,

        /// Category to assign.
        category: String,

        /// Display alias shown instead of the raw app name.
        #[arg(long)]
        alias: Option<String>,
    },

    /// List apps with recorded usage but no category, most used first.
    Missing,
}
