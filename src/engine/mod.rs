//! Execution engine module
//!
//! Runs fixed, ordered statement lists against one warehouse connection.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SchemaManager` - drops and recreates the seven tables
//! - `LoadDriver` - stages raw JSON, then fills the star tables
//! - `plan` - the statements a procedure would run, without running them
//!
//! Statements run strictly in order. Each one commits before the next
//! starts; the first failure stops the run and is returned with the step
//! name attached. Nothing is retried or rolled back.

mod types;

pub use types::{Procedure, RunReport, StepReport, TableCount};

use crate::config::DwhConfig;
use crate::database::Warehouse;
use crate::error::{Error, Result};
use crate::queries::{
    create_statements, drop_statements, staging_statements, transform_statements,
    truncate_statements, Statement,
};
use crate::schema::{STAGING_TABLES, STAR_TABLES};
use crate::types::Dialect;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Execute one statement, timing it
pub async fn run_statement(
    warehouse: &mut dyn Warehouse,
    statement: &Statement,
) -> Result<StepReport> {
    info!(step = %statement.step, phase = %statement.phase, "Running statement");
    debug!("{}", statement.sql);

    let start = Instant::now();
    let rows_affected = warehouse
        .execute(&statement.sql)
        .await
        .map_err(|e| Error::statement(&statement.step, e))?;
    let elapsed = start.elapsed();

    info!(
        step = %statement.step,
        rows = rows_affected,
        "=== DONE IN: {:.2} sec",
        elapsed.as_secs_f64()
    );

    Ok(StepReport {
        step: statement.step.clone(),
        phase: statement.phase,
        table: statement.table,
        rows_affected,
        elapsed,
    })
}

/// Execute statements in order, stopping at the first failure
pub async fn run_statements(
    warehouse: &mut dyn Warehouse,
    statements: &[Statement],
) -> Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(statements.len());
    for statement in statements {
        reports.push(run_statement(warehouse, statement).await?);
    }
    Ok(reports)
}

/// Statements a procedure runs, in order
pub fn plan(procedure: Procedure, config: &DwhConfig) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    if procedure.resets_schema() {
        statements.extend(drop_statements());
        statements.extend(create_statements(config.dialect()));
    }
    if procedure.loads_data() {
        if config.warehouse.truncate_staging {
            statements.extend(truncate_statements());
        }
        statements.extend(staging_statements(config)?);
        statements.extend(transform_statements(config.dialect()));
    }
    Ok(statements)
}

// ============================================================================
// Schema Manager
// ============================================================================

/// Drops and recreates the star schema
pub struct SchemaManager<'a> {
    warehouse: &'a mut dyn Warehouse,
}

impl<'a> SchemaManager<'a> {
    pub fn new(warehouse: &'a mut dyn Warehouse) -> Self {
        Self { warehouse }
    }

    fn dialect(&self) -> Dialect {
        self.warehouse.dialect()
    }

    /// DROP TABLE IF EXISTS for every table
    pub async fn drop_tables(&mut self) -> Result<Vec<StepReport>> {
        run_statements(&mut *self.warehouse, &drop_statements()).await
    }

    /// CREATE TABLE IF NOT EXISTS for every table
    pub async fn create_tables(&mut self) -> Result<Vec<StepReport>> {
        let statements = create_statements(self.dialect());
        run_statements(&mut *self.warehouse, &statements).await
    }

    /// Drop then create, as one timed run
    pub async fn reset(&mut self) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(Procedure::CreateTables, self.warehouse.describe());

        report.steps.extend(self.drop_tables().await?);
        report.steps.extend(self.create_tables().await?);

        report.elapsed = start.elapsed();
        info!(
            tables = STAR_TABLES.len() + STAGING_TABLES.len(),
            "Schema recreated in {:.2} sec",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

// ============================================================================
// Load Driver
// ============================================================================

/// Stages raw data and fills the fact and dimension tables
pub struct LoadDriver<'a> {
    warehouse: &'a mut dyn Warehouse,
    config: &'a DwhConfig,
}

impl<'a> LoadDriver<'a> {
    pub fn new(warehouse: &'a mut dyn Warehouse, config: &'a DwhConfig) -> Self {
        Self { warehouse, config }
    }

    /// Warn about rows left by an earlier load, or clear them when asked to
    ///
    /// Returns the warnings raised.
    pub async fn prepare_staging(&mut self) -> Result<(Vec<StepReport>, Vec<String>)> {
        if self.config.warehouse.truncate_staging {
            let steps = run_statements(&mut *self.warehouse, &truncate_statements()).await?;
            return Ok((steps, Vec::new()));
        }

        let mut warnings = Vec::new();
        for table in STAGING_TABLES {
            let rows = self
                .warehouse
                .query_i64(&table.count_sql())
                .await
                .map_err(|e| Error::statement(format!("count_{}", table.name()), e))?;
            if rows > 0 {
                let message = format!(
                    "{table} already holds {rows} rows; this load appends to them and re-inserts their star rows"
                );
                warn!("{}", message);
                warnings.push(message);
            }
        }
        Ok((Vec::new(), warnings))
    }

    /// Bulk-load both staging tables
    pub async fn load_staging_tables(&mut self) -> Result<Vec<StepReport>> {
        if self.config.dialect() != self.warehouse.dialect() {
            return Err(Error::config(format!(
                "configured engine is {} but connected to {}",
                self.config.dialect(),
                self.warehouse.dialect()
            )));
        }
        let statements = staging_statements(self.config)?;
        run_statements(&mut *self.warehouse, &statements).await
    }

    /// INSERT ... SELECT into the fact and dimension tables
    pub async fn insert_tables(&mut self) -> Result<Vec<StepReport>> {
        let statements = transform_statements(self.warehouse.dialect());
        run_statements(&mut *self.warehouse, &statements).await
    }

    /// Row counts of the fact and dimension tables
    pub async fn count_rows(&mut self) -> Result<Vec<TableCount>> {
        let mut counts = Vec::with_capacity(STAR_TABLES.len());
        for table in STAR_TABLES {
            let rows = self
                .warehouse
                .query_i64(&table.count_sql())
                .await
                .map_err(|e| Error::statement(format!("count_{}", table.name()), e))?;
            counts.push(TableCount { table, rows });
        }
        Ok(counts)
    }

    /// Stage, transform and count, as one timed run
    pub async fn run(&mut self) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new(Procedure::Etl, self.warehouse.describe());

        let (steps, warnings) = self.prepare_staging().await?;
        report.steps.extend(steps);
        report.warnings.extend(warnings);

        report.steps.extend(self.load_staging_tables().await?);
        report.steps.extend(self.insert_tables().await?);
        report.row_counts = self.count_rows().await?;

        report.elapsed = start.elapsed();
        info!(
            "Load finished in {:.2} sec",
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }
}

/// Run a procedure on an open warehouse
pub async fn run_procedure(
    procedure: Procedure,
    warehouse: &mut dyn Warehouse,
    config: &DwhConfig,
) -> Result<RunReport> {
    match procedure {
        Procedure::CreateTables => SchemaManager::new(warehouse).reset().await,
        Procedure::Etl => LoadDriver::new(warehouse, config).run().await,
        Procedure::Full => {
            let start = Instant::now();
            let schema = SchemaManager::new(&mut *warehouse).reset().await?;
            let load = LoadDriver::new(warehouse, config).run().await?;

            let mut report = RunReport::new(Procedure::Full, load.warehouse.clone());
            report.started_at = schema.started_at;
            report.steps = schema.steps;
            report.steps.extend(load.steps);
            report.row_counts = load.row_counts;
            report.warnings = load.warnings;
            report.elapsed = start.elapsed();
            Ok(report)
        }
    }
}
