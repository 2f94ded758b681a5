use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    version,
    about = "Personal notebook: tagged, foldered, optionally encrypted notes"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the notebook data directory
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Directory used as the remote for sync
    #[clap(long, value_parser)]
    pub sync_dir: Option<PathBuf>,

    /// Password of an encrypted notebook
    #[clap(short, long)]
    pub password: Option<String>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the notebook application
    #[clap(subcommand)]
    pub command: Commands,
}
