//! CLI module
//!
//! Command-line interface for the schema manager and the load driver.
//!
//! # Commands
//!
//! - `create-tables` - Drop and recreate all tables
//! - `etl` - Stage raw JSON and fill the star tables
//! - `run` - Both, on one connection
//! - `plan` - Print the SQL a command would run

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PlanTarget};
pub use runner::{init_logging, Runner};
