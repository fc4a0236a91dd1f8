//! Engine types
//!
//! Procedures, per-statement timings and the run report printed at the end
//! of every run.

use crate::schema::Table;
use crate::types::Phase;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// The procedures a run can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    /// Drop and recreate all tables
    CreateTables,
    /// Stage then transform
    Etl,
    /// CreateTables followed by Etl on the same connection
    Full,
}

impl Procedure {
    pub fn as_str(self) -> &'static str {
        match self {
            Procedure::CreateTables => "create_tables",
            Procedure::Etl => "etl",
            Procedure::Full => "full",
        }
    }

    /// Whether the procedure drops and recreates the schema
    pub fn resets_schema(self) -> bool {
        matches!(self, Procedure::CreateTables | Procedure::Full)
    }

    /// Whether the procedure loads and transforms data
    pub fn loads_data(self) -> bool {
        matches!(self, Procedure::Etl | Procedure::Full)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing of one executed statement
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub phase: Phase,
    pub table: Table,
    /// Rows reported by the warehouse (0 for DDL)
    pub rows_affected: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

/// Row count of one table after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: Table,
    pub rows: i64,
}

/// Summary of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub procedure: Procedure,
    /// Warehouse description (no secrets)
    pub warehouse: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    /// Star-table row counts, filled after a load
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_counts: Vec<TableCount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(procedure: Procedure, warehouse: impl Into<String>) -> Self {
        Self {
            procedure,
            warehouse: warehouse.into(),
            started_at: Utc::now(),
            steps: Vec::new(),
            row_counts: Vec::new(),
            warnings: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step.as_str()).collect()
    }

    /// Steps belonging to one phase
    pub fn steps_in(&self, phase: Phase) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    /// Row count recorded for a table, if counted
    pub fn row_count(&self, table: Table) -> Option<i64> {
        self.row_counts
            .iter()
            .find(|c| c.table == table)
            .map(|c| c.rows)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} on {}", self.procedure, self.warehouse)?;
        for step in &self.steps {
            writeln!(
                f,
                "  {:<10} {:<26} {:>10} rows  {:>8.2}s",
                step.phase.as_str(),
                step.step,
                step.rows_affected,
                step.elapsed.as_secs_f64()
            )?;
        }
        if !self.row_counts.is_empty() {
            writeln!(f, "Row counts:")?;
            for count in &self.row_counts {
                writeln!(f, "  {:<26} {:>10}", count.table.name(), count.rows)?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "WARNING: {warning}")?;
        }
        write!(f, "=== DONE IN: {:.2} sec", self.elapsed.as_secs_f64())
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
