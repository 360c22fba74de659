//! # Signal Router CLI Module
//!
//! This module implements the CLI interface for the signal router.
//!
//! ## Available Commands
//!
//! - `check` - Build the graph from the settings file and report counts
//! - `status` - Show nodes, inputs and outputs
//! - `graph` - List every edge with its activation
//! - `route` - Show the shortest path between two nodes
//! - `connect` - Plan and dry-run a connect request

mod commands;

use clap::{Parser, Subcommand};
use signal_router_core::RouterError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Signal Router - AV signal routing
///
/// Builds a signal graph from a venue's device connections and routes
/// sources to displays through switchers and matrices.
#[derive(Parser, Debug)]
#[command(name = "signal-router")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the settings file (.toml or .json)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the graph and report node and edge counts
    Check,

    /// Show graph status
    Status,

    /// List every edge of the graph
    Graph,

    /// Show the shortest path between two nodes
    Route {
        /// Signal origin (e.g. a laptop)
        #[arg(short, long)]
        from: String,

        /// Destination (e.g. a display)
        #[arg(short, long)]
        to: String,
    },

    /// Plan and dry-run a connect request
    Connect {
        /// Routes as SOURCE=TARGET[,TARGET...]
        #[arg(required = true, value_parser = parse_route_arg)]
        routes: Vec<RouteArg>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RouterError> {
    let config = signal_router::resolve_config_path(cli.config.as_deref());
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Check) => cmd_check(&config, json_mode),
        Some(Commands::Status) => cmd_status(&config, json_mode).await,
        Some(Commands::Graph) => cmd_graph(&config, json_mode),
        Some(Commands::Route { from, to }) => cmd_route(&config, json_mode, &from, &to).await,
        Some(Commands::Connect { routes }) => cmd_connect(&config, json_mode, routes).await,
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode).await
        }
    }
}
