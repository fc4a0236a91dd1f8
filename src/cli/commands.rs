//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Song play warehouse driver
#[derive(Parser, Debug)]
#[command(name = "songplay-dwh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (INI)
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Report format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Clear staging tables before loading instead of appending
    #[arg(long, global = true)]
    pub truncate_staging: bool,

    /// Verbose output (logs every SQL statement)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Drop and recreate the staging, fact and dimension tables
    CreateTables,

    /// Load staging tables from object storage, then fill the star tables
    Etl,

    /// create-tables followed by etl on one connection
    Run,

    /// Print the statements a command would run, without connecting
    Plan {
        /// Command to plan
        #[arg(value_enum, default_value = "run")]
        target: PlanTarget,
    },
}

/// Command whose statements `plan` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlanTarget {
    CreateTables,
    Etl,
    Run,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// Human-readable table
    Pretty,
}

impl Cli {
    /// Arguments for a fixed procedure binary (`create_tables`, `etl`)
    ///
    /// Global flags are still honoured; any subcommand given is ignored.
    pub fn for_command(command: Commands) -> Self {
        let args = FixedArgs::parse();
        Self {
            config: args.config,
            format: args.format,
            truncate_staging: args.truncate_staging,
            verbose: args.verbose,
            command,
        }
    }
}

/// Flags accepted by the single-purpose binaries
#[derive(Parser, Debug)]
#[command(author, version, about = "Run one warehouse procedure", long_about = None)]
struct FixedArgs {
    /// Configuration file (INI)
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Report format
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Clear staging tables before loading instead of appending
    #[arg(long)]
    truncate_staging: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}
