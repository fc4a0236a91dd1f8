//! Embedded DuckDB warehouse
//!
//! Runs the same schema and transforms as Redshift against a local DuckDB
//! file (or an in-memory database). Staging data is read with `read_json`
//! from local paths, or from S3 through the httpfs extension.

use super::Warehouse;
use crate::config::DwhConfig;
use crate::error::{Error, Result};
use crate::types::Dialect;
use async_trait::async_trait;
use duckdb::Connection;
use tracing::{debug, info};

/// In-memory database marker accepted as a path
pub const IN_MEMORY: &str = ":memory:";

/// DuckDB-backed warehouse
pub struct DuckDbWarehouse {
    /// DuckDB connection; `None` once closed
    conn: Option<Connection>,
    /// Database path used (for logging)
    path: String,
}

impl DuckDbWarehouse {
    /// Open the database named by `[WAREHOUSE] PATH`
    pub fn open(config: &DwhConfig) -> Result<Self> {
        let warehouse = Self::open_path(&config.warehouse.path)?;

        let remote = [
            &config.s3.log_data,
            &config.s3.song_data,
            &config.s3.log_jsonpath,
        ]
        .iter()
        .any(|loc| is_remote(loc));
        if remote {
            warehouse.configure_cloud_storage(config.s3.region.as_deref())?;
        }

        Ok(warehouse)
    }

    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open_path(path: &str) -> Result<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        info!(path = %path, "Opened DuckDB warehouse");
        Ok(Self {
            conn: Some(conn),
            path: path.to_string(),
        })
    }

    /// Throwaway in-memory warehouse
    pub fn in_memory() -> Result<Self> {
        Self::open_path(IN_MEMORY)
    }

    /// Underlying connection, for reading results back
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::connection("DuckDB connection already closed"))
    }

    /// Load httpfs and pass S3 credentials from the environment
    fn configure_cloud_storage(&self, region: Option<&str>) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch("INSTALL httpfs; LOAD httpfs;")
            .map_err(|e| Error::config(format!("Failed to load httpfs extension: {e}")))?;

        let region = region
            .map(String::from)
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok())
            .unwrap_or_else(|| "us-east-1".to_string());
        conn.execute_batch(&format!("SET s3_region = '{region}';"))
            .map_err(|e| Error::config(format!("Failed to configure S3 region: {e}")))?;

        if let (Ok(key_id), Ok(secret)) = (
            std::env::var("AWS_ACCESS_KEY_ID"),
            std::env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            conn.execute_batch(&format!(
                "SET s3_access_key_id = '{key_id}'; SET s3_secret_access_key = '{secret}';"
            ))
            .map_err(|e| Error::config(format!("Failed to configure S3: {e}")))?;

            // Custom endpoint (MinIO, R2, ...)
            if let Ok(endpoint) = std::env::var("AWS_ENDPOINT") {
                conn.execute_batch(&format!(
                    "SET s3_endpoint = '{}'; SET s3_url_style = 'path';",
                    endpoint
                        .trim_start_matches("https://")
                        .trim_start_matches("http://")
                ))
                .map_err(|e| Error::config(format!("Failed to configure S3 endpoint: {e}")))?;
            }
        }

        debug!(region = %region, "Configured DuckDB for S3 reads");
        Ok(())
    }
}

fn is_remote(location: &str) -> bool {
    ["s3://", "s3a://", "http://", "https://"]
        .iter()
        .any(|scheme| location.starts_with(scheme))
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Duckdb
    }

    fn describe(&self) -> String {
        format!("duckdb:{}", self.path)
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let changed = self.connection()?.execute(sql, [])?;
        Ok(changed as u64)
    }

    async fn query_i64(&mut self, sql: &str) -> Result<i64> {
        let value = self
            .connection()?
            .query_row(sql, [], |row| row.get::<_, i64>(0))?;
        Ok(value)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::DuckDb(e))?;
            debug!(path = %self.path, "Closed DuckDB warehouse");
        }
        Ok(())
    }
}
