//! End-to-end pipeline tests on an in-memory DuckDB warehouse
//!
//! The schema, staging loads and transforms run exactly as they would in
//! production, only against the DuckDB dialect.

use songplay_dwh::database::DuckDbWarehouse;
use songplay_dwh::schema::ALL_TABLES;
use songplay_dwh::{DwhConfig, LoadDriver, SchemaManager, Warehouse};
use std::path::Path;

const SONG_ID: &str = "SOZCTXZ12AB0182364";
const ARTIST_ID: &str = "AR5KOSW1187FB35FF4";

// 2018-11-12 02:37:38.796 UTC, a Monday
const TS_FIRST: i64 = 1_541_990_258_796;
const TS_SECOND: i64 = 1_541_990_264_796;
const TS_THIRD: i64 = 1_541_990_300_000;
const TS_HOME: i64 = 1_541_990_200_000;

const LOG_JSONPATHS: &str = r#"{
    "jsonpaths": [
        "$['artist']", "$['auth']", "$['firstName']", "$['gender']",
        "$['itemInSession']", "$['lastName']", "$['length']", "$['level']",
        "$['location']", "$['method']", "$['page']", "$['registration']",
        "$['sessionId']", "$['song']", "$['status']", "$['ts']",
        "$['userAgent']", "$['userId']"
    ]
}"#;

fn duckdb_config(log_data: &str, song_data: &str, jsonpaths: &str) -> DwhConfig {
    let text = format!(
        "[CLUSTER]
host=localhost
dbname=dwh
user=dwhuser
password=
port=5439

[IAM_ROLE]
ARN=

[S3]
LOG_DATA={log_data}
LOG_JSONPATH={jsonpaths}
SONG_DATA={song_data}

[WAREHOUSE]
ENGINE=duckdb
PATH=:memory:
"
    );
    DwhConfig::from_ini_str(&text).unwrap()
}

fn unused_config() -> DwhConfig {
    duckdb_config("/data/log_data", "/data/song_data", "/data/log_json_path.json")
}

async fn fresh_warehouse() -> DuckDbWarehouse {
    let mut wh = DuckDbWarehouse::in_memory().unwrap();
    SchemaManager::new(&mut wh).reset().await.unwrap();
    wh
}

async fn insert_event(
    wh: &mut DuckDbWarehouse,
    page: &str,
    user_id: i64,
    level: &str,
    artist: Option<&str>,
    song: Option<&str>,
    ts: i64,
    item_in_session: i64,
) {
    let text = |v: Option<&str>| v.map_or("NULL".to_string(), |s| format!("'{s}'"));
    let sql = format!(
        "INSERT INTO staging_events (artist, first_name, last_name, gender, item_in_session, level, \
         location, page, session_id, song, start_time, user_agent, user_id) \
         VALUES ({}, 'First{user_id}', 'Last{user_id}', 'F', {item_in_session}, '{level}', \
         'Eugene, OR', '{page}', 38, {}, {ts}, 'Mozilla/5.0', {user_id})",
        text(artist),
        text(song)
    );
    wh.execute(&sql).await.unwrap();
}

async fn insert_song(wh: &mut DuckDbWarehouse, song_id: &str, title: &str, artist_id: &str) {
    let sql = format!(
        "INSERT INTO staging_songs (num_songs, artist_id, artist_latitude, artist_longitude, \
         artist_location, artist_name, song_id, title, duration, year) \
         VALUES (1, '{artist_id}', 42.5, -71.2, 'Dublin', 'Elena', '{song_id}', '{title}', 218.6, 2009)"
    );
    wh.execute(&sql).await.unwrap();
}

async fn count(wh: &mut DuckDbWarehouse, sql: &str) -> i64 {
    wh.query_i64(sql).await.unwrap()
}

async fn transform(wh: &mut DuckDbWarehouse) {
    let config = unused_config();
    LoadDriver::new(wh, &config).insert_tables().await.unwrap();
}

/// Three plays, one home-page visit, two staging rows for one song
async fn seed_fixture(wh: &mut DuckDbWarehouse) {
    insert_event(wh, "NextSong", 39, "free", Some("Elena"), Some("Setanta matins"), TS_FIRST, 0).await;
    insert_event(wh, "NextSong", 39, "paid", Some("Unknown Band"), Some("Nope"), TS_SECOND, 1).await;
    insert_event(wh, "NextSong", 8, "free", Some("Other"), Some("Other song"), TS_THIRD, 0).await;
    insert_event(wh, "Home", 39, "free", None, None, TS_HOME, 2).await;

    insert_song(wh, SONG_ID, "Setanta matins", ARTIST_ID).await;
    insert_song(wh, SONG_ID, "Setanta matins (Remix)", ARTIST_ID).await;
}

// ============================================================================
// Schema manager
// ============================================================================

#[tokio::test]
async fn test_schema_reset_is_idempotent() {
    let mut wh = DuckDbWarehouse::in_memory().unwrap();
    SchemaManager::new(&mut wh).reset().await.unwrap();
    insert_song(&mut wh, SONG_ID, "Setanta matins", ARTIST_ID).await;
    SchemaManager::new(&mut wh).reset().await.unwrap();

    let tables = count(
        &mut wh,
        "SELECT CAST(COUNT(*) AS BIGINT) FROM information_schema.tables WHERE table_schema = 'main'",
    )
    .await;
    assert_eq!(tables, 7);

    for table in ALL_TABLES {
        let sql = format!("SELECT CAST(COUNT(*) AS BIGINT) FROM {}", table.ident());
        assert_eq!(count(&mut wh, &sql).await, 0, "{table} should be empty");
    }
}

// ============================================================================
// Transforms
// ============================================================================

#[tokio::test]
async fn test_songplays_only_from_next_song() {
    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;
    transform(&mut wh).await;

    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songplays").await, 3);
    assert_eq!(
        count(
            &mut wh,
            &format!("SELECT CAST(COUNT(*) AS BIGINT) FROM songplays WHERE start_time = epoch_ms({TS_HOME})")
        )
        .await,
        0
    );
}

#[tokio::test]
async fn test_duplicate_songs_collapse() {
    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;
    transform(&mut wh).await;

    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songs").await, 1);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM artists").await, 1);

    let conn = wh.connection().unwrap();
    let (title, artist_id): (String, String) = conn
        .query_row("SELECT title, artist_id FROM songs", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(title, "Setanta matins");
    assert_eq!(artist_id, ARTIST_ID);
}

#[tokio::test]
async fn test_join_matches_exact_artist_and_title() {
    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;
    transform(&mut wh).await;

    let conn = wh.connection().unwrap();
    let mut stmt = conn
        .prepare("SELECT song_id, artist_id FROM songplays ORDER BY start_time")
        .unwrap();
    let rows: Vec<(Option<String>, Option<String>)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        rows,
        vec![
            (Some(SONG_ID.to_string()), Some(ARTIST_ID.to_string())),
            (None, None),
            (None, None),
        ]
    );
}

#[tokio::test]
async fn test_timestamp_conversion() {
    let mut wh = fresh_warehouse().await;
    insert_event(&mut wh, "NextSong", 39, "free", Some("Elena"), Some("Setanta matins"), TS_FIRST, 0).await;
    transform(&mut wh).await;

    let conn = wh.connection().unwrap();
    let start_time: String = conn
        .query_row("SELECT CAST(start_time AS VARCHAR) FROM songplays", [], |row| row.get(0))
        .unwrap();
    assert_eq!(start_time, "2018-11-12 02:37:38.796");

    let parts: (i64, i64, i64, i64, i64, i64) = conn
        .query_row(
            "SELECT CAST(hour AS BIGINT), CAST(day AS BIGINT), CAST(week AS BIGINT), \
             CAST(month AS BIGINT), CAST(year AS BIGINT), CAST(weekday AS BIGINT) FROM \"time\"",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(parts, (2, 12, 46, 11, 2018, 1));
}

#[tokio::test]
async fn test_users_keep_latest_level() {
    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;
    transform(&mut wh).await;

    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM users").await, 2);

    let conn = wh.connection().unwrap();
    let level: String = conn
        .query_row("SELECT level FROM users WHERE user_id = 39", [], |row| row.get(0))
        .unwrap();
    assert_eq!(level, "paid");
}

#[tokio::test]
async fn test_end_to_end_counts() {
    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;
    transform(&mut wh).await;

    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songplays").await, 3);
    assert_eq!(
        count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songplays WHERE song_id IS NOT NULL").await,
        1
    );
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songs").await, 1);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM artists").await, 1);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM \"time\"").await, 3);
    assert_eq!(
        count(&mut wh, "SELECT CAST(COUNT(DISTINCT songplay_id) AS BIGINT) FROM songplays").await,
        3
    );
}

#[tokio::test]
async fn test_identical_song_rows_yield_one_play() {
    let mut wh = fresh_warehouse().await;
    insert_event(&mut wh, "NextSong", 39, "free", Some("Elena"), Some("Setanta matins"), TS_FIRST, 0).await;
    insert_song(&mut wh, SONG_ID, "Setanta matins", ARTIST_ID).await;
    insert_song(&mut wh, SONG_ID, "Setanta matins", ARTIST_ID).await;
    transform(&mut wh).await;

    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songplays").await, 1);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songs").await, 1);
    assert_eq!(
        count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM songplays WHERE song_id IS NOT NULL").await,
        1
    );
}

#[tokio::test]
async fn test_same_title_from_two_songs_matches_once() {
    let mut wh = fresh_warehouse().await;
    insert_event(&mut wh, "NextSong", 39, "free", Some("Elena"), Some("Setanta matins"), TS_FIRST, 0).await;
    insert_song(&mut wh, "SOBBBBB12AB0182364", "Setanta matins", ARTIST_ID).await;
    insert_song(&mut wh, SONG_ID, "Setanta matins", ARTIST_ID).await;
    transform(&mut wh).await;

    let conn = wh.connection().unwrap();
    let song_id: String = conn
        .query_row("SELECT song_id FROM songplays", [], |row| row.get(0))
        .unwrap();
    assert_eq!(song_id, "SOBBBBB12AB0182364");
}

#[tokio::test]
async fn test_ids_stable_when_events_differ_only_in_level() {
    async fn levels_by_id(paid_first: bool) -> Vec<(i64, String)> {
        let mut wh = fresh_warehouse().await;
        let order = if paid_first { ["paid", "free"] } else { ["free", "paid"] };
        for level in order {
            insert_event(&mut wh, "NextSong", 39, level, Some("Elena"), Some("Setanta matins"), TS_FIRST, 0).await;
        }
        transform(&mut wh).await;

        let conn = wh.connection().unwrap();
        let mut stmt = conn
            .prepare("SELECT CAST(songplay_id AS BIGINT), level FROM songplays ORDER BY songplay_id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    let expected = vec![(1, "free".to_string()), (2, "paid".to_string())];
    assert_eq!(levels_by_id(true).await, expected);
    assert_eq!(levels_by_id(false).await, expected);
}

#[tokio::test]
async fn test_songplay_ids_are_deterministic() {
    async fn ids() -> Vec<(i64, String)> {
        let mut wh = fresh_warehouse().await;
        seed_fixture(&mut wh).await;
        transform(&mut wh).await;

        let conn = wh.connection().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT CAST(songplay_id AS BIGINT), CAST(start_time AS VARCHAR) \
                 FROM songplays ORDER BY songplay_id",
            )
            .unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    let first = ids().await;
    assert_eq!(first, ids().await);
    assert_eq!(first[0].0, 1);
    assert_eq!(first[0].1, "2018-11-12 02:37:38.796");
}

// ============================================================================
// Staging from files
// ============================================================================

fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[tokio::test]
async fn test_full_load_from_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let log_data = dir.path().join("log_data");
    let song_data = dir.path().join("song_data");
    let jsonpaths = dir.path().join("log_json_path.json");

    write_file(
        &log_data.join("2018/11/2018-11-12-events.json"),
        &[
            format!(
                r#"{{"artist":"Elena","auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":218.6,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"PUT","page":"NextSong","registration":1540919166796.0,"sessionId":38,"song":"Setanta matins","status":200,"ts":{TS_FIRST},"userAgent":"Mozilla/5.0","userId":"39"}}"#
            ),
            format!(
                r#"{{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":1,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":{TS_HOME},"userAgent":"Mozilla/5.0","userId":"39"}}"#
            ),
            format!(
                r#"{{"artist":"Nobody","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":4,"lastName":"Summers","length":100.0,"level":"paid","location":"Phoenix, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"Unmatched","status":200,"ts":{TS_SECOND},"userAgent":"Mozilla/5.0","userId":"8"}}"#
            ),
        ]
        .join("\n"),
    );
    write_file(
        &song_data.join("A/A/A/TRAAAAW128F429D538.json"),
        &format!(
            r#"{{"num_songs":1,"artist_id":"{ARTIST_ID}","artist_latitude":null,"artist_longitude":null,"artist_location":"","artist_name":"Elena","song_id":"{SONG_ID}","title":"Setanta matins","duration":269.58322,"year":0}}"#
        ),
    );
    write_file(&jsonpaths, LOG_JSONPATHS);

    let config = duckdb_config(
        log_data.to_str().unwrap(),
        song_data.to_str().unwrap(),
        jsonpaths.to_str().unwrap(),
    );
    let mut wh = fresh_warehouse().await;
    let report = LoadDriver::new(&mut wh, &config).run().await.unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(
        report.step_names(),
        vec![
            "load_staging_events",
            "load_staging_songs",
            "insert_songplays",
            "insert_users",
            "insert_songs",
            "insert_artists",
            "insert_time",
        ]
    );
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM staging_events").await, 3);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM staging_songs").await, 1);

    use songplay_dwh::schema::Table;
    assert_eq!(report.row_count(Table::Songplays), Some(2));
    assert_eq!(report.row_count(Table::Users), Some(2));
    assert_eq!(report.row_count(Table::Songs), Some(1));
    assert_eq!(report.row_count(Table::Artists), Some(1));
    assert_eq!(report.row_count(Table::Time), Some(2));

    // Mapped keys land in the renamed columns
    let conn = wh.connection().unwrap();
    let (user_id, first_name): (i64, String) = conn
        .query_row(
            "SELECT CAST(user_id AS BIGINT), first_name FROM staging_events WHERE page = 'NextSong' ORDER BY start_time LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((user_id, first_name.as_str()), (39, "Walter"));
}

#[tokio::test]
async fn test_rerun_without_truncate_warns() {
    let dir = tempfile::tempdir().unwrap();
    let jsonpaths = dir.path().join("log_json_path.json");
    write_file(&jsonpaths, LOG_JSONPATHS);
    let config = duckdb_config(
        dir.path().join("log_data").to_str().unwrap(),
        dir.path().join("song_data").to_str().unwrap(),
        jsonpaths.to_str().unwrap(),
    );

    let mut wh = fresh_warehouse().await;
    seed_fixture(&mut wh).await;

    let (steps, warnings) = LoadDriver::new(&mut wh, &config)
        .prepare_staging()
        .await
        .unwrap();
    assert!(steps.is_empty());
    assert_eq!(warnings.len(), 2);

    let config = config.with_truncate_staging(true);
    let (steps, warnings) = LoadDriver::new(&mut wh, &config)
        .prepare_staging()
        .await
        .unwrap();
    assert_eq!(steps.len(), 2);
    assert!(warnings.is_empty());
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM staging_events").await, 0);
    assert_eq!(count(&mut wh, "SELECT CAST(COUNT(*) AS BIGINT) FROM staging_songs").await, 0);
}
