//! Error types for songplay-dwh
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Warehouse driver errors are kept as-is so the native message reaches
//! the user unchanged.

use thiserror::Error;

/// The main error type for songplay-dwh
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Redshift error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Statement '{step}' failed: {source}")]
    Statement {
        step: String,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // Staging Errors
    // ============================================================================
    #[error("JSONPaths error: {message}")]
    JsonPaths { message: String },

    #[error("Unsupported data location for {engine}: {location}")]
    UnsupportedLocation { engine: String, location: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Wrap a warehouse error with the name of the step that raised it
    pub fn statement(step: impl Into<String>, source: Error) -> Self {
        Self::Statement {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Create a JSONPaths error
    pub fn json_paths(message: impl Into<String>) -> Self {
        Self::JsonPaths {
            message: message.into(),
        }
    }

    /// Name of the failing step, if this error came from a statement
    pub fn step(&self) -> Option<&str> {
        match self {
            Error::Statement { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Check if this error was raised by the warehouse itself
    pub fn is_warehouse_error(&self) -> bool {
        match self {
            Error::Postgres(_) | Error::DuckDb(_) => true,
            Error::Statement { source, .. } => source.is_warehouse_error(),
            _ => false,
        }
    }
}

/// Result type alias for songplay-dwh
pub type Result<T> = std::result::Result<T, Error>;
