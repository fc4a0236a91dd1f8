//! INSERT ... SELECT statements for the fact and dimension tables
//!
//! Statement order: songplays, users, songs, artists, time. None of them
//! reads another's output; all of them read only the staging tables.

use super::Statement;
use crate::schema::Table;
use crate::types::{Dialect, Phase};

/// Millisecond epoch column expression converted to a UTC timestamp
pub fn epoch_ms_to_timestamp(dialect: Dialect, column: &str) -> String {
    match dialect {
        Dialect::Redshift => {
            format!("TIMESTAMP 'epoch' + {column}::NUMERIC / 1000 * INTERVAL '1 second'")
        }
        Dialect::Duckdb => format!("epoch_ms({column})"),
    }
}

/// The five transform statements in execution order
pub fn transform_statements(dialect: Dialect) -> Vec<Statement> {
    vec![
        Statement::new(Phase::Transform, Table::Songplays, songplays(dialect)),
        Statement::new(Phase::Transform, Table::Users, users()),
        Statement::new(Phase::Transform, Table::Songs, songs()),
        Statement::new(Phase::Transform, Table::Artists, artists()),
        Statement::new(Phase::Transform, Table::Time, time(dialect)),
    ]
}

// The identifier ordering covers every column a play event carries, so ids
// are stable across runs over the same staging data. Each (artist, title)
// pair matches at most one song, keeping one fact row per event.
fn songplays(dialect: Dialect) -> String {
    format!(
        "INSERT INTO songplays (songplay_id, start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT
    ROW_NUMBER() OVER (
        ORDER BY se.start_time, se.session_id, se.item_in_session, se.user_id,
                 se.artist, se.song, se.level, se.location, se.user_agent,
                 ss.song_id, ss.artist_id
    ),
    {},
    se.user_id,
    se.level,
    ss.song_id,
    ss.artist_id,
    se.session_id,
    se.location,
    se.user_agent
FROM staging_events se
LEFT JOIN (
    SELECT song_id, artist_id, artist_name, title
    FROM (
        SELECT
            s.song_id,
            s.artist_id,
            s.artist_name,
            s.title,
            ROW_NUMBER() OVER (
                PARTITION BY s.artist_name, s.title
                ORDER BY s.song_id, s.artist_id
            ) AS rank_in_match
        FROM staging_songs s
    ) ranked
    WHERE rank_in_match = 1
) ss
    ON se.artist = ss.artist_name
   AND se.song = ss.title
WHERE se.page = 'NextSong'",
        epoch_ms_to_timestamp(dialect, "se.start_time")
    )
}

// Level comes from the user's most recent NextSong event.
fn users() -> String {
    "INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT
        se.user_id,
        se.first_name,
        se.last_name,
        se.gender,
        se.level,
        ROW_NUMBER() OVER (
            PARTITION BY se.user_id
            ORDER BY se.start_time DESC, se.session_id DESC, se.item_in_session DESC
        ) AS rank_in_user
    FROM staging_events se
    WHERE se.page = 'NextSong'
      AND se.user_id IS NOT NULL
) latest
WHERE rank_in_user = 1"
        .to_string()
}

fn songs() -> String {
    "INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT
        ss.song_id,
        ss.title,
        ss.artist_id,
        ss.year,
        ss.duration,
        ROW_NUMBER() OVER (
            PARTITION BY ss.song_id
            ORDER BY ss.title, ss.artist_id, ss.year, ss.duration
        ) AS rank_in_song
    FROM staging_songs ss
    WHERE ss.song_id IS NOT NULL
) ranked
WHERE rank_in_song = 1"
        .to_string()
}

fn artists() -> String {
    "INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, name, location, latitude, longitude
FROM (
    SELECT
        ss.artist_id,
        ss.artist_name AS name,
        ss.artist_location AS location,
        ss.artist_latitude AS latitude,
        ss.artist_longitude AS longitude,
        ROW_NUMBER() OVER (
            PARTITION BY ss.artist_id
            ORDER BY ss.artist_name, ss.artist_location, ss.artist_latitude, ss.artist_longitude
        ) AS rank_in_artist
    FROM staging_songs ss
    WHERE ss.artist_id IS NOT NULL
) ranked
WHERE rank_in_artist = 1"
        .to_string()
}

// EXTRACT(WEEK) is the ISO week and EXTRACT(DOW) counts from Sunday = 0 in
// both dialects.
fn time(dialect: Dialect) -> String {
    format!(
        "INSERT INTO \"time\" (start_time, hour, day, week, month, year, weekday)
SELECT
    ts,
    EXTRACT(HOUR FROM ts),
    EXTRACT(DAY FROM ts),
    EXTRACT(WEEK FROM ts),
    EXTRACT(MONTH FROM ts),
    EXTRACT(YEAR FROM ts),
    EXTRACT(DOW FROM ts)
FROM (
    SELECT DISTINCT {} AS ts
    FROM staging_events se
    WHERE se.page = 'NextSong'
      AND se.start_time IS NOT NULL
) events",
        epoch_ms_to_timestamp(dialect, "se.start_time")
    )
}
