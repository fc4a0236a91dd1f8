//! Warehouse configuration
//!
//! The driver reads one INI file (`dwh.cfg` by default) into a [`DwhConfig`]
//! exactly once per process and hands that value to every component that
//! needs it.
//!
//! ```ini
//! [CLUSTER]
//! host=example.abc123.us-west-2.redshift.amazonaws.com
//! dbname=dwh
//! user=dwhuser
//! password=secret
//! port=5439
//!
//! [IAM_ROLE]
//! ARN='arn:aws:iam::123456789012:role/dwhRole'
//!
//! [S3]
//! LOG_DATA='s3://udacity-dend/log_data'
//! LOG_JSONPATH='s3://udacity-dend/log_json_path.json'
//! SONG_DATA='s3://udacity-dend/song_data'
//! ```
//!
//! Any key can be overridden from the environment with a `DWH_` prefix and
//! `__` between section and key, e.g. `DWH_CLUSTER__PASSWORD`.

use crate::error::{Error, Result};
use crate::types::Dialect;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file name, resolved against the working directory
pub const DEFAULT_CONFIG_PATH: &str = "dwh.cfg";

/// Default DuckDB database file for the local engine
pub const DEFAULT_DUCKDB_PATH: &str = "dwh.duckdb";

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "DWH";

// ============================================================================
// Typed Configuration
// ============================================================================

/// Complete driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwhConfig {
    /// Cluster connection settings
    pub cluster: ClusterConfig,
    /// Object-storage locations of the raw datasets
    pub s3: S3Config,
    /// Role the warehouse assumes to read object storage
    pub iam_role: IamRoleConfig,
    /// Backend selection and run options
    pub warehouse: WarehouseConfig,
}

/// `[CLUSTER]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub host: String,
    pub dbname: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub port: u16,
}

/// `[S3]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Prefix holding song-metadata JSON
    pub song_data: String,
    /// Prefix holding activity-log JSON
    pub log_data: String,
    /// JSONPaths document mapping log keys to staging columns
    pub log_jsonpath: String,
    /// Bucket region, appended to COPY when the cluster lives elsewhere
    pub region: Option<String>,
}

/// `[IAM_ROLE]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IamRoleConfig {
    pub arn: String,
}

/// Optional `[WAREHOUSE]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Which backend to connect to
    pub engine: Dialect,
    /// Database file for the DuckDB engine (`:memory:` for a throwaway one)
    pub path: String,
    /// Clear staging tables before loading
    pub truncate_staging: bool,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            engine: Dialect::Redshift,
            path: DEFAULT_DUCKDB_PATH.to_string(),
            truncate_staging: false,
        }
    }
}

// ============================================================================
// Raw INI shape
// ============================================================================

// Section and key names are matched case-insensitively; aliases cover the
// upper-case spelling used in existing config files.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "CLUSTER")]
    cluster: Option<RawCluster>,
    #[serde(alias = "S3")]
    s3: Option<RawS3>,
    #[serde(alias = "IAM_ROLE")]
    iam_role: Option<RawIamRole>,
    #[serde(alias = "WAREHOUSE", default)]
    warehouse: Option<RawWarehouse>,
}

#[derive(Debug, Deserialize)]
struct RawCluster {
    #[serde(alias = "HOST")]
    host: Option<String>,
    #[serde(alias = "DBNAME", alias = "DB_NAME")]
    dbname: Option<String>,
    #[serde(alias = "USER", alias = "DB_USER")]
    user: Option<String>,
    #[serde(alias = "PASSWORD", alias = "DB_PASSWORD")]
    password: Option<String>,
    #[serde(alias = "PORT", alias = "DB_PORT")]
    port: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawS3 {
    #[serde(alias = "SONG_DATA")]
    song_data: Option<String>,
    #[serde(alias = "LOG_DATA")]
    log_data: Option<String>,
    #[serde(alias = "LOG_JSONPATH")]
    log_jsonpath: Option<String>,
    #[serde(alias = "REGION")]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIamRole {
    #[serde(alias = "ARN")]
    arn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWarehouse {
    #[serde(alias = "ENGINE")]
    engine: Option<String>,
    #[serde(alias = "PATH")]
    path: Option<String>,
    #[serde(alias = "TRUNCATE_STAGING")]
    truncate_staging: Option<String>,
}

impl DwhConfig {
    /// Load from an INI file, applying `DWH_` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::config(format!("Non UTF-8 config path: {}", path.display())))?;

        let settings = Config::builder()
            .add_source(File::new(path_str, FileFormat::Ini))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        debug!(path = %path.display(), "Loaded configuration file");

        Self::from_settings(settings)
    }

    /// Parse INI text directly (no environment overrides)
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Ini))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self> {
        let raw: RawConfig = settings.try_deserialize()?;
        let config = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let cluster = raw.cluster.ok_or_else(|| Error::missing_field("CLUSTER"))?;
        let s3 = raw.s3.ok_or_else(|| Error::missing_field("S3"))?;
        let iam_role = raw.iam_role.ok_or_else(|| Error::missing_field("IAM_ROLE"))?;

        let port_str = required(cluster.port, "CLUSTER.port")?;
        let port = port_str
            .parse::<u16>()
            .map_err(|e| Error::invalid_value("CLUSTER.port", format!("'{port_str}': {e}")))?;

        let mut warehouse = WarehouseConfig::default();
        if let Some(section) = raw.warehouse {
            if let Some(engine) = section.engine.as_deref().map(unquote) {
                warehouse.engine = engine.parse()?;
            }
            if let Some(path) = section.path.as_deref().map(unquote) {
                if !path.is_empty() {
                    warehouse.path = path;
                }
            }
            if let Some(flag) = section.truncate_staging.as_deref().map(unquote) {
                warehouse.truncate_staging = parse_bool(&flag, "WAREHOUSE.truncate_staging")?;
            }
        }

        Ok(Self {
            cluster: ClusterConfig {
                host: required(cluster.host, "CLUSTER.host")?,
                dbname: required(cluster.dbname, "CLUSTER.dbname")?,
                user: required(cluster.user, "CLUSTER.user")?,
                password: cluster.password.as_deref().map(unquote).unwrap_or_default(),
                port,
            },
            s3: S3Config {
                song_data: required(s3.song_data, "S3.SONG_DATA")?,
                log_data: required(s3.log_data, "S3.LOG_DATA")?,
                log_jsonpath: required(s3.log_jsonpath, "S3.LOG_JSONPATH")?,
                region: s3
                    .region
                    .as_deref()
                    .map(unquote)
                    .filter(|r| !r.is_empty()),
            },
            iam_role: IamRoleConfig {
                arn: iam_role.arn.as_deref().map(unquote).unwrap_or_default(),
            },
            warehouse,
        })
    }

    /// Check that every value the selected engine needs is present
    pub fn validate(&self) -> Result<()> {
        if self.cluster.port == 0 {
            return Err(Error::invalid_value("CLUSTER.port", "must be non-zero"));
        }

        if self.warehouse.engine == Dialect::Redshift && self.iam_role.arn.is_empty() {
            return Err(Error::missing_field("IAM_ROLE.ARN"));
        }

        Ok(())
    }

    /// Override the staging truncation flag (used by the CLI)
    #[must_use]
    pub fn with_truncate_staging(mut self, truncate: bool) -> Self {
        self.warehouse.truncate_staging = truncate;
        self
    }

    /// Selected SQL dialect
    pub fn dialect(&self) -> Dialect {
        self.warehouse.engine
    }

    /// Path of the DuckDB database file
    pub fn duckdb_path(&self) -> PathBuf {
        PathBuf::from(&self.warehouse.path)
    }

    /// Connection description for logs (password masked)
    pub fn connection_info(&self) -> String {
        match self.warehouse.engine {
            Dialect::Redshift => format!(
                "host={} dbname={} user={} password=**** port={}",
                self.cluster.host, self.cluster.dbname, self.cluster.user, self.cluster.port
            ),
            Dialect::Duckdb => format!("duckdb:{}", self.warehouse.path),
        }
    }
}

/// Strip one layer of matching single or double quotes and surrounding space
pub fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .as_deref()
        .map(unquote)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::missing_field(field))
}

fn parse_bool(value: &str, field: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => Err(Error::invalid_value(field, format!("'{other}' is not a boolean"))),
    }
}
