//! SQL statement builders
//!
//! Every statement the driver runs is built here, per dialect, as a named
//! [`Statement`]. Nothing outside this module writes SQL text.
//!
//! # Statement groups
//!
//! - [`drop_statements`] / [`create_statements`] - schema manager
//! - [`truncate_statements`] - optional staging reset
//! - [`staging_statements`] - bulk loads from object storage
//! - [`transform_statements`] - INSERT ... SELECT into the star tables

mod jsonpaths;
mod staging;
mod transform;

pub use jsonpaths::{JsonPathsDocument, KeyMapping};
pub use staging::{duckdb_glob, staging_statements};
pub use transform::{epoch_ms_to_timestamp, transform_statements};

use crate::schema::{Table, ALL_TABLES, STAGING_TABLES};
use crate::types::{Dialect, Phase};
use serde::Serialize;
use std::fmt;

/// A single named SQL statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    /// Step name used in logs and reports (e.g. `insert_songplays`)
    pub step: String,
    pub phase: Phase,
    /// Table the statement writes to
    pub table: Table,
    pub sql: String,
}

impl Statement {
    pub fn new(phase: Phase, table: Table, sql: impl Into<String>) -> Self {
        let verb = match phase {
            Phase::Drop => "drop",
            Phase::Create => "create",
            Phase::Truncate => "truncate",
            Phase::Stage => "load",
            Phase::Transform => "insert",
        };
        Self {
            step: format!("{verb}_{}", table.name()),
            phase,
            table,
            sql: sql.into(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-- {}\n{};", self.step, self.sql)
    }
}

/// DROP TABLE IF EXISTS for all seven tables
pub fn drop_statements() -> Vec<Statement> {
    ALL_TABLES
        .iter()
        .map(|t| Statement::new(Phase::Drop, *t, t.drop_sql()))
        .collect()
}

/// CREATE TABLE IF NOT EXISTS for all seven tables
pub fn create_statements(dialect: Dialect) -> Vec<Statement> {
    ALL_TABLES
        .iter()
        .map(|t| Statement::new(Phase::Create, *t, t.create_sql(dialect)))
        .collect()
}

/// TRUNCATE for both staging tables
pub fn truncate_statements() -> Vec<Statement> {
    STAGING_TABLES
        .iter()
        .map(|t| Statement::new(Phase::Truncate, *t, t.truncate_sql()))
        .collect()
}

/// Quote a string as a SQL literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote an identifier, doubling embedded double quotes
pub fn quote_ident(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
