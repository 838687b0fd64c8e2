//! CLI argument parsing for the tour-optimizer binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tour-optimizer", about = "Delivery tour optimization engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Optimize a tour request and print the result as JSON
    Optimize {
        /// Tour request JSON file (`packages` and optional `settings`)
        #[arg(long, short)]
        input: PathBuf,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Validate route settings and exit
    CheckSettings {
        /// Route settings JSON file
        #[arg(long, short)]
        input: PathBuf,
    },
}
