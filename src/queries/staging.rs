//! Bulk-load statements for the staging tables
//!
//! Redshift ingests straight from S3 with `COPY ... IAM_ROLE ... JSON`.
//! DuckDB reads the same JSON with `read_json`, with every key declared as
//! VARCHAR and cast into the staging column type.

use super::jsonpaths::{identity_mapping, JsonPathsDocument, KeyMapping};
use super::{quote_ident, quote_literal, Statement};
use crate::config::DwhConfig;
use crate::error::{Error, Result};
use crate::schema::{ColumnType, Table};
use crate::types::{Dialect, Phase};

/// Both staging loads, events first
pub fn staging_statements(config: &DwhConfig) -> Result<Vec<Statement>> {
    match config.dialect() {
        Dialect::Redshift => Ok(vec![
            Statement::new(
                Phase::Stage,
                Table::StagingEvents,
                redshift_copy(
                    Table::StagingEvents,
                    &config.s3.log_data,
                    &config.iam_role.arn,
                    &config.s3.log_jsonpath,
                    config.s3.region.as_deref(),
                ),
            ),
            Statement::new(
                Phase::Stage,
                Table::StagingSongs,
                redshift_copy(
                    Table::StagingSongs,
                    &config.s3.song_data,
                    &config.iam_role.arn,
                    "auto",
                    config.s3.region.as_deref(),
                ),
            ),
        ]),
        Dialect::Duckdb => {
            let jsonpaths = load_local_jsonpaths(&config.s3.log_jsonpath)?;
            let events_mapping = jsonpaths.mapping_for(Table::StagingEvents)?;
            Ok(vec![
                Statement::new(
                    Phase::Stage,
                    Table::StagingEvents,
                    duckdb_insert_from_json(
                        Table::StagingEvents,
                        &config.s3.log_data,
                        &events_mapping,
                    ),
                ),
                Statement::new(
                    Phase::Stage,
                    Table::StagingSongs,
                    duckdb_insert_from_json(
                        Table::StagingSongs,
                        &config.s3.song_data,
                        &identity_mapping(Table::StagingSongs),
                    ),
                ),
            ])
        }
    }
}

/// `json_format` is either `auto` or the URI of a JSONPaths document
fn redshift_copy(
    table: Table,
    source: &str,
    iam_role: &str,
    json_format: &str,
    region: Option<&str>,
) -> String {
    let mut sql = format!(
        "COPY {} FROM {}\nIAM_ROLE {}\nJSON {}",
        table.ident(),
        quote_literal(source),
        quote_literal(iam_role),
        quote_literal(json_format)
    );
    if let Some(region) = region {
        sql.push_str(&format!("\nREGION {}", quote_literal(region)));
    }
    sql
}

fn duckdb_insert_from_json(table: Table, source: &str, mapping: &[KeyMapping<'_>]) -> String {
    let columns = mapping
        .iter()
        .map(|m| m.column.name)
        .collect::<Vec<_>>()
        .join(", ");

    let projections = mapping
        .iter()
        .map(|m| {
            let key = quote_ident(m.key);
            match m.column.column_type {
                ColumnType::Varchar => format!("    {key}"),
                other => format!("    CAST(NULLIF({key}, '') AS {})", other.sql()),
            }
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let declared = mapping
        .iter()
        .map(|m| format!("{}: 'VARCHAR'", quote_literal(m.key)))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({columns})\nSELECT\n{projections}\nFROM read_json({}, format = 'auto', columns = {{{declared}}})",
        table.ident(),
        quote_literal(&duckdb_glob(source))
    )
}

/// Turn a prefix into a recursive glob over JSON files
///
/// Redshift COPY loads every object under a prefix; DuckDB needs a glob.
/// Locations that already name a file or contain a wildcard pass through.
pub fn duckdb_glob(location: &str) -> String {
    let trimmed = location.trim_end_matches('/');
    if trimmed.contains('*') || trimmed.ends_with(".json") || trimmed.ends_with(".jsonl") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/**/*.json")
    }
}

fn load_local_jsonpaths(location: &str) -> Result<JsonPathsDocument> {
    if location.contains("://") && !location.starts_with("file://") {
        return Err(Error::UnsupportedLocation {
            engine: Dialect::Duckdb.to_string(),
            location: location.to_string(),
        });
    }
    JsonPathsDocument::load(location.trim_start_matches("file://"))
}
