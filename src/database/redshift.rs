//! Redshift warehouse over the PostgreSQL wire protocol
//!
//! Statements go through the simple query protocol: Redshift runs each one
//! as its own implicitly committed transaction, and COPY cannot be
//! prepared.

use super::Warehouse;
use crate::config::DwhConfig;
use crate::error::{Error, Result};
use crate::types::Dialect;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, info, warn};

/// Redshift-backed warehouse
pub struct RedshiftWarehouse {
    /// Client handle; `None` once closed
    client: Option<Client>,
    /// Task driving the socket
    connection: Option<JoinHandle<()>>,
    /// Connection description (password masked)
    info: String,
}

impl RedshiftWarehouse {
    /// Connect with the `[CLUSTER]` settings
    pub async fn connect(config: &DwhConfig) -> Result<Self> {
        let info = config.connection_info();
        info!(connection = %info, "Connecting to Redshift");

        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.cluster.host)
            .dbname(&config.cluster.dbname)
            .user(&config.cluster.user)
            .password(&config.cluster.password)
            .port(config.cluster.port)
            .application_name(crate::NAME);

        let (client, connection) = pg.connect(NoTls).await?;

        // Spawn connection handler
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("Redshift connection error: {}", e);
            }
        });

        Ok(Self {
            client: Some(client),
            connection: Some(handle),
            info,
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::connection("Redshift connection already closed"))
    }
}

/// Affected-row count from a simple query response
fn rows_affected(messages: &[SimpleQueryMessage]) -> u64 {
    messages
        .iter()
        .map(|m| match m {
            SimpleQueryMessage::CommandComplete(n) => *n,
            _ => 0,
        })
        .sum()
}

/// First column of the first row, parsed as an integer
fn first_i64(messages: &[SimpleQueryMessage]) -> Result<i64> {
    let row = messages
        .iter()
        .find_map(|m| match m {
            SimpleQueryMessage::Row(row) => Some(row),
            _ => None,
        })
        .ok_or_else(|| Error::Other("query returned no rows".to_string()))?;

    let text = row
        .get(0)
        .ok_or_else(|| Error::Other("query returned NULL".to_string()))?;

    text.parse::<i64>()
        .map_err(|e| Error::Other(format!("expected integer, got '{text}': {e}")))
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    fn describe(&self) -> String {
        self.info.clone()
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        let messages = self.client()?.simple_query(sql).await?;
        Ok(rows_affected(&messages))
    }

    async fn query_i64(&mut self, sql: &str) -> Result<i64> {
        let messages = self.client()?.simple_query(sql).await?;
        first_i64(&messages)
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client ends the session; the connection task then exits.
        if self.client.take().is_some() {
            if let Some(handle) = self.connection.take() {
                if let Err(e) = handle.await {
                    warn!("Redshift connection task failed: {}", e);
                }
            }
            debug!(connection = %self.info, "Closed Redshift connection");
        }
        Ok(())
    }
}
