//! # Rex CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server against a live repository
//! - `replay` - Feed recorded repository responses through a session offline
//! - `resolve` - Show where a reload of an instance would be sent
//! - `config` - Print the effective configuration

mod commands;

use clap::{Parser, Subcommand};
use rex::config::RexConfig;
use rex_core::RexError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Rex - repository explorer
///
/// Accumulates entities and relationships retrieved from a metadata
/// repository into an undoable, generation-indexed graph.
#[derive(Parser, Debug)]
#[command(name = "rex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to rex.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Replay recorded repository responses and print the history
    Replay {
        /// Path to the recording (JSON array of steps)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the reload target for a provenance
    Resolve {
        /// Provenance tag (home, refCopy, proxy, ent)
        #[arg(long)]
        provenance: String,

        /// Server the instance was originally retrieved from
        #[arg(short, long)]
        server: String,

        /// Platform hosting that server
        #[arg(short = 'P', long)]
        platform: String,

        /// The original retrieval was an enterprise query
        #[arg(short, long)]
        enterprise: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RexError> {
    let mut config = RexConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cmd_serve(&config).await
        }
        Commands::Replay { file } => cmd_replay(&file, json_mode),
        Commands::Resolve {
            provenance,
            server,
            platform,
            enterprise,
        } => cmd_resolve(&provenance, &server, &platform, enterprise, json_mode),
        Commands::Config => cmd_config(&config),
    }
}
