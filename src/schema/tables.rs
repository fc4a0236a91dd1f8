//! Column definitions for the seven tables

use super::types::{Column, ColumnType, Table};

use ColumnType::{BigInt, Integer, Real, Timestamp, Varchar};

/// Every table, in drop/create order
pub const ALL_TABLES: [Table; 7] = [
    Table::StagingEvents,
    Table::StagingSongs,
    Table::Songplays,
    Table::Users,
    Table::Songs,
    Table::Artists,
    Table::Time,
];

/// Tables filled by the bulk-load statements
pub const STAGING_TABLES: [Table; 2] = [Table::StagingEvents, Table::StagingSongs];

/// Fact and dimension tables, in transform order
pub const STAR_TABLES: [Table; 5] = [
    Table::Songplays,
    Table::Users,
    Table::Songs,
    Table::Artists,
    Table::Time,
];

// Column order of staging_events matches the JSONPaths document for the
// activity log, position for position.
const STAGING_EVENTS: [Column; 18] = [
    Column::new("artist", Varchar),
    Column::new("auth", Varchar),
    Column::new("first_name", Varchar),
    Column::new("gender", Varchar),
    Column::new("item_in_session", Integer),
    Column::new("last_name", Varchar),
    Column::new("duration", Real),
    Column::new("level", Varchar),
    Column::new("location", Varchar),
    Column::new("method", Varchar),
    Column::new("page", Varchar),
    Column::new("registration", Real),
    Column::new("session_id", Integer),
    Column::new("song", Varchar),
    Column::new("status", Integer),
    Column::new("start_time", BigInt),
    Column::new("user_agent", Varchar),
    Column::new("user_id", Integer),
];

// Song JSON keys equal these column names, so no mapping document is needed.
const STAGING_SONGS: [Column; 10] = [
    Column::new("num_songs", Integer),
    Column::new("artist_id", Varchar),
    Column::new("artist_latitude", Real),
    Column::new("artist_longitude", Real),
    Column::new("artist_location", Varchar),
    Column::new("artist_name", Varchar),
    Column::new("song_id", Varchar),
    Column::new("title", Varchar),
    Column::new("duration", Real),
    Column::new("year", Integer),
];

const SONGPLAYS: [Column; 9] = [
    Column::new("songplay_id", Integer).primary_key(),
    Column::new("start_time", Timestamp).not_null().sort_key(),
    Column::new("user_id", Integer).not_null(),
    Column::new("level", Varchar),
    Column::new("song_id", Varchar),
    Column::new("artist_id", Varchar),
    Column::new("session_id", Integer).not_null(),
    Column::new("location", Varchar),
    Column::new("user_agent", Varchar),
];

const USERS: [Column; 5] = [
    Column::new("user_id", Integer).primary_key().sort_key(),
    Column::new("first_name", Varchar),
    Column::new("last_name", Varchar),
    Column::new("gender", Varchar),
    Column::new("level", Varchar),
];

const SONGS: [Column; 5] = [
    Column::new("song_id", Varchar).primary_key(),
    Column::new("title", Varchar).sort_key(),
    Column::new("artist_id", Varchar),
    Column::new("year", Integer),
    Column::new("duration", Real),
];

const ARTISTS: [Column; 5] = [
    Column::new("artist_id", Varchar).primary_key(),
    Column::new("name", Varchar).sort_key(),
    Column::new("location", Varchar),
    Column::new("latitude", Real),
    Column::new("longitude", Real),
];

const TIME: [Column; 7] = [
    Column::new("start_time", Timestamp).primary_key().sort_key(),
    Column::new("hour", Integer),
    Column::new("day", Integer),
    Column::new("week", Integer),
    Column::new("month", Integer),
    Column::new("year", Integer),
    Column::new("weekday", Integer),
];

pub(super) fn columns(table: Table) -> &'static [Column] {
    match table {
        Table::StagingEvents => &STAGING_EVENTS,
        Table::StagingSongs => &STAGING_SONGS,
        Table::Songplays => &SONGPLAYS,
        Table::Users => &USERS,
        Table::Songs => &SONGS,
        Table::Artists => &ARTISTS,
        Table::Time => &TIME,
    }
}
