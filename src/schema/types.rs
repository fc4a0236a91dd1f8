//! Table and column types for the star schema

use crate::types::Dialect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Warehouse column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Varchar,
    Integer,
    BigInt,
    Real,
    Timestamp,
}

impl ColumnType {
    /// SQL type name (identical in both dialects)
    pub fn sql(self) -> &'static str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Real => "REAL",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// A single column definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
    /// Redshift sort key; ignored by other dialects
    pub sort_key: bool,
}

impl Column {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            not_null: false,
            primary_key: false,
            sort_key: false,
        }
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Primary key columns are always NOT NULL
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    #[must_use]
    pub const fn sort_key(mut self) -> Self {
        self.sort_key = true;
        self
    }

    /// Column definition as it appears inside CREATE TABLE
    pub fn ddl(&self, dialect: Dialect) -> String {
        let mut def = format!("{} {}", self.name, self.column_type.sql());
        if self.sort_key && dialect == Dialect::Redshift {
            def.push_str(" SORTKEY");
        }
        if self.not_null {
            def.push_str(" NOT NULL");
        }
        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        def
    }
}

/// Role of a table in the star schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Staging,
    Fact,
    Dimension,
}

/// The seven tables of the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    StagingEvents,
    StagingSongs,
    Songplays,
    Users,
    Songs,
    Artists,
    Time,
}

impl Table {
    /// Unquoted table name
    pub fn name(self) -> &'static str {
        match self {
            Table::StagingEvents => "staging_events",
            Table::StagingSongs => "staging_songs",
            Table::Songplays => "songplays",
            Table::Users => "users",
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Time => "time",
        }
    }

    /// Name as written in SQL; `time` collides with the type keyword
    pub fn ident(self) -> &'static str {
        match self {
            Table::Time => "\"time\"",
            other => other.name(),
        }
    }

    pub fn kind(self) -> TableKind {
        match self {
            Table::StagingEvents | Table::StagingSongs => TableKind::Staging,
            Table::Songplays => TableKind::Fact,
            Table::Users | Table::Songs | Table::Artists | Table::Time => TableKind::Dimension,
        }
    }

    /// Column definitions in table order
    pub fn columns(self) -> &'static [Column] {
        super::tables::columns(self)
    }

    /// Column names in table order
    pub fn column_names(self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    /// The natural key column, if the table has one
    pub fn primary_key(self) -> Option<&'static str> {
        self.columns().iter().find(|c| c.primary_key).map(|c| c.name)
    }

    pub fn drop_sql(self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.ident())
    }

    pub fn create_sql(self, dialect: Dialect) -> String {
        let columns = self
            .columns()
            .iter()
            .map(|c| format!("    {}", c.ddl(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {} (\n{columns}\n)", self.ident())
    }

    pub fn truncate_sql(self) -> String {
        format!("TRUNCATE {}", self.ident())
    }

    pub fn count_sql(self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.ident())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
