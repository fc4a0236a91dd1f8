//! JSONPaths documents
//!
//! The activity-log keys (`firstName`, `itemInSession`, `ts`, ...) do not
//! match the staging column names. A JSONPaths document lists one path per
//! staging column, in column order:
//!
//! ```json
//! { "jsonpaths": ["$['artist']", "$['auth']", "$.firstName"] }
//! ```
//!
//! Redshift consumes the document directly. For DuckDB the document is
//! resolved here into explicit key-to-column pairs.

use crate::error::{Error, Result};
use crate::schema::{Column, Table};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

/// Matches `$['key']`, `$["key"]` and `$.key`
static PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\$(?:\[\s*(?:'([^']+)'|"([^"]+)")\s*\]|\.([A-Za-z_][A-Za-z0-9_]*))$"#).unwrap()
});

/// Parsed JSONPaths document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsonPathsDocument {
    pub jsonpaths: Vec<String>,
}

/// One JSON key feeding one staging column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapping<'a> {
    pub key: &'a str,
    pub column: &'static Column,
}

impl JsonPathsDocument {
    /// Parse document text
    pub fn parse(text: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(text)?;
        if doc.jsonpaths.is_empty() {
            return Err(Error::json_paths("document lists no paths"));
        }
        Ok(doc)
    }

    /// Read and parse a local document
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::json_paths(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Top-level key named by each path, in document order
    pub fn keys(&self) -> Result<Vec<&str>> {
        self.jsonpaths
            .iter()
            .map(|path| {
                let caps = PATH_REGEX.captures(path.trim()).ok_or_else(|| {
                    Error::json_paths(format!(
                        "unsupported path expression '{path}' (expected $['key'] or $.key)"
                    ))
                })?;
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .ok_or_else(|| Error::json_paths(format!("empty key in '{path}'")))
            })
            .collect()
    }

    /// Pair each path with the table column at the same position
    pub fn mapping_for(&self, table: Table) -> Result<Vec<KeyMapping<'_>>> {
        let keys = self.keys()?;
        let columns = table.columns();
        if keys.len() != columns.len() {
            return Err(Error::json_paths(format!(
                "{} paths for {} columns in {table}",
                keys.len(),
                columns.len()
            )));
        }
        Ok(keys
            .into_iter()
            .zip(columns)
            .map(|(key, column)| KeyMapping { key, column })
            .collect())
    }
}

/// Identity mapping: JSON keys equal column names
pub fn identity_mapping(table: Table) -> Vec<KeyMapping<'static>> {
    table
        .columns()
        .iter()
        .map(|column| KeyMapping {
            key: column.name,
            column,
        })
        .collect()
}
