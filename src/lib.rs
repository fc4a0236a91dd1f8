// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unused_async)]

//! # songplay-dwh
//!
//! Schema manager and batch load driver for a song play analytics
//! warehouse on Amazon Redshift (or a local DuckDB file).
//!
//! ## Features
//!
//! - **Schema manager**: drops and recreates two staging tables, one fact
//!   table and four dimension tables
//! - **Bulk staging**: `COPY` of song metadata and event logs from S3, with
//!   the event columns mapped through a JSONPaths document
//! - **Star transform**: `INSERT ... SELECT` into `songplays`, `users`,
//!   `songs`, `artists` and `time`, deduplicated on each natural key
//! - **Run report**: per-statement timings and final row counts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use songplay_dwh::{database, engine, DwhConfig, Procedure, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = DwhConfig::load("dwh.cfg")?;
//!     let mut warehouse = database::connect(&config).await?;
//!
//!     let report = engine::run_procedure(Procedure::Full, warehouse.as_mut(), &config).await?;
//!     println!("{report}");
//!
//!     warehouse.close().await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  cli: create-tables | etl | run | plan                       │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  engine: SchemaManager  LoadDriver  RunReport                │
//! └───────┬───────────────────────────────────────┬──────────────┘
//!         │ Statement                              │ execute
//! ┌───────┴──────────────────────┐  ┌──────────────┴──────────────┐
//! │ queries: DDL  COPY  INSERT   │  │ database: Warehouse trait   │
//! │ schema:  7 tables, columns   │  │ Redshift │ DuckDB           │
//! └──────────────────────────────┘  └─────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// SQL dialects and statement phases
pub mod types;

/// `dwh.cfg` loading and validation
pub mod config;

/// Table and column definitions
pub mod schema;

/// SQL statement builders
pub mod queries;

/// Warehouse connections
pub mod database;

/// Schema manager and load driver
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::DwhConfig;
pub use database::Warehouse;
pub use engine::{LoadDriver, Procedure, RunReport, SchemaManager};
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
