//! Common types used throughout songplay-dwh
//!
//! Shared enums that more than one module needs to agree on: which SQL
//! dialect a warehouse speaks and which phase of a run a statement
//! belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// SQL Dialect
// ============================================================================

/// SQL flavour spoken by a warehouse backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Amazon Redshift over the PostgreSQL wire protocol
    #[default]
    Redshift,
    /// Embedded DuckDB (local development and tests)
    #[serde(alias = "duck")]
    Duckdb,
}

impl Dialect {
    /// Lowercase name used in config files and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Redshift => "redshift",
            Dialect::Duckdb => "duckdb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redshift" | "postgres" | "postgresql" => Ok(Dialect::Redshift),
            "duckdb" | "duck" => Ok(Dialect::Duckdb),
            other => Err(Error::invalid_value(
                "WAREHOUSE.engine",
                format!("unknown engine '{other}' (expected redshift or duckdb)"),
            )),
        }
    }
}

// ============================================================================
// Run Phase
// ============================================================================

/// Phase of a run a statement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// DROP TABLE IF EXISTS
    Drop,
    /// CREATE TABLE IF NOT EXISTS
    Create,
    /// Clearing staging tables before a reload (opt-in)
    Truncate,
    /// Bulk load from object storage into staging
    Stage,
    /// INSERT ... SELECT into the star tables
    Transform,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Drop => "drop",
            Phase::Create => "create",
            Phase::Truncate => "truncate",
            Phase::Stage => "stage",
            Phase::Transform => "transform",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
