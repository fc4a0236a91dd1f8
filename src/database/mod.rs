//! Warehouse backends
//!
//! The driver talks to exactly one warehouse per run through the
//! [`Warehouse`] trait. Two backends exist:
//!
//! - [`RedshiftWarehouse`] - Amazon Redshift over the PostgreSQL wire protocol
//! - [`DuckDbWarehouse`] - embedded DuckDB, used for local runs and tests
//!
//! Every statement runs in autocommit mode: once `execute` returns, the
//! statement's effects are committed.

mod duck;
mod redshift;

pub use duck::DuckDbWarehouse;
pub use redshift::RedshiftWarehouse;

use crate::config::DwhConfig;
use crate::error::Result;
use crate::types::Dialect;
use async_trait::async_trait;

/// A single open warehouse connection
#[async_trait]
pub trait Warehouse: Send {
    /// SQL dialect this backend speaks
    fn dialect(&self) -> Dialect;

    /// Connection description for logs (no secrets)
    fn describe(&self) -> String;

    /// Execute one statement and commit it, returning affected rows
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Run a query returning a single integer (e.g. `COUNT(*)`)
    async fn query_i64(&mut self, sql: &str) -> Result<i64>;

    /// Close the connection
    async fn close(&mut self) -> Result<()>;
}

/// Open the backend selected by `[WAREHOUSE] ENGINE`
pub async fn connect(config: &DwhConfig) -> Result<Box<dyn Warehouse>> {
    match config.dialect() {
        Dialect::Redshift => Ok(Box::new(RedshiftWarehouse::connect(config).await?)),
        Dialect::Duckdb => Ok(Box::new(DuckDbWarehouse::open(config)?)),
    }
}
