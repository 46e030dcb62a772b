//! CLI argument parsing and command routing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// deepseek-proxy: OpenAI-compatible API for the deepseekv3.com web chat
#[derive(Debug, Parser)]
#[command(name = "deepseek-proxy")]
#[command(
    about = "OpenAI-compatible streaming proxy for the deepseekv3.com web chat",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default locations
    #[arg(short, long, global = true, env = "DEEPSEEKV3_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the model catalog
    Models,

    /// Run browser automation once and print the captured session
    Reauth,

    /// Show configuration
    Config {
        /// Print the config file path instead of its contents
        #[arg(long)]
        path: bool,
    },

    /// Show version information
    Version,
}

impl Cli {
    /// Parse CLI arguments from environment
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
