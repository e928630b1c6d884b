//! CLI interface for Royalty Desk

pub mod commands;
mod output;
pub mod shell;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "royalty-desk")]
#[command(author = "Krakaw")]
#[command(version = "2.0.0")]
#[command(about = "Royalty administration dashboard with session lifecycle management", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: search upward for royalty-desk.toml)
    #[arg(short, long, global = true, env = "ROYALTY_DESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new royalty-desk.toml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Start the HTTP server and web UI
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Sign in from the terminal
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Keep the session across restarts
        #[arg(short, long)]
        remember: bool,
    },

    /// Show the current session
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Sign out, after confirmation
    Logout {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Interactive session with idle detection
    Shell,

    /// Check configuration and session storage
    Doctor,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
