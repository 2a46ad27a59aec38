use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and listening logs into the Sparkify star schema", long_about = None)]
pub struct Cli {
    /// Configuration file to use instead of ./Config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the configured song and log directories
    Process(ProcessArgs),
    /// Create the star schema tables if missing
    Migrate,
    /// Drop and recreate all star schema tables
    ResetDb,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Load into memory instead of PostgreSQL and report what would be written
    #[arg(long)]
    pub dry_run: bool,
    /// Only load song metadata files
    #[arg(long, conflicts_with = "logs_only")]
    pub songs_only: bool,
    /// Only load activity log files
    #[arg(long)]
    pub logs_only: bool,
}
