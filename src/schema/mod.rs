//! Star schema definition
//!
//! The seven fixed tables shared by the schema manager and the load driver:
//! two staging tables that mirror the raw JSON, one fact table and four
//! dimension tables.
//!
//! # Tables
//!
//! - `staging_events` / `staging_songs` - raw landing zone, no keys
//! - `songplays` - fact table, one row per NextSong event
//! - `users`, `songs`, `artists`, `time` - deduplicated dimensions

mod tables;
mod types;

pub use tables::{ALL_TABLES, STAGING_TABLES, STAR_TABLES};
pub use types::{Column, ColumnType, Table, TableKind};
