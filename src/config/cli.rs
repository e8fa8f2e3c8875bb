//! Command-line argument definitions for machine-client.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for machine-client.
#[derive(Debug, Parser)]
#[command(name = "machine-client")]
#[command(
    author,
    version,
    about = "Container engine clients for docker-machine managed hosts"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Helper executable to query.
    #[arg(long, global = true)]
    pub helper: Option<String>,

    /// Machine name passed to the helper.
    #[arg(long, global = true)]
    pub machine: Option<String>,

    /// Trust the engine CA without presenting a client certificate.
    #[arg(long, global = true)]
    pub no_client_cert: bool,

    /// Ask the helper for the API version instead of probing the engine.
    #[arg(long, global = true)]
    pub helper_version: bool,
}

/// Available subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Print the endpoint reported by the helper.
    Config,

    /// Build a client and print the engine version.
    Version,

    /// Build a client and ping the engine.
    Ping,
}
