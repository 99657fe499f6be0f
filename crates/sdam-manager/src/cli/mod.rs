pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// SDAM Manager CLI
///
/// This CLI provides commands to manage the Service Deployment Agent
/// Manager, currently serving the manager daemon.
pub struct Cli {
    /// Path to an optional configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the SDAM manager server
    Serve,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
