use rusqlite::Connection;
use taskboard_core::db::migrations::latest_version;
use taskboard_core::db::{open_db, open_db_in_memory, DbError};
use taskboard_core::{KeyValueStore, SqliteKeyValueStore, StorageEvent, StoreError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
    assert_table_exists(&conn, "kv_sequence");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let sequence_rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM kv_sequence;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(sequence_rows, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_in_missing_directory_reports_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("board.sqlite3");

    match open_db(&path).unwrap_err() {
        DbError::Open { mode, .. } => assert_eq!(mode, "file"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_reports_its_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE kv_sequence (id INTEGER PRIMARY KEY);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 1),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteKeyValueStore::try_new(conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE kv_entries (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL);
         CREATE TABLE kv_sequence (id INTEGER PRIMARY KEY NOT NULL, value INTEGER NOT NULL);",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteKeyValueStore::try_new(conn),
        Err(StoreError::MissingRequiredColumn {
            table: "kv_entries",
            column: "version"
        })
    ));
}

#[test]
fn set_get_remove_roundtrip() {
    let mut store = SqliteKeyValueStore::open_in_memory().unwrap();

    assert_eq!(store.get("board").unwrap(), None);
    store.set("board", "[]").unwrap();
    store.set("board", "[1]").unwrap();
    assert_eq!(store.get("board").unwrap().as_deref(), Some("[1]"));

    store.remove("board").unwrap();
    store.remove("board").unwrap();
    assert_eq!(store.get("board").unwrap(), None);
}

#[test]
fn values_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.sqlite3");

    let mut first = SqliteKeyValueStore::open(&path).unwrap();
    first.set("theme", "\"dark\"").unwrap();
    drop(first);

    let mut second = SqliteKeyValueStore::open(&path).unwrap();
    assert_eq!(second.get("theme").unwrap().as_deref(), Some("\"dark\""));
}

#[test]
fn poll_reports_foreign_writes_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");
    let mut tab_a = SqliteKeyValueStore::open(&path).unwrap();
    let mut tab_b = SqliteKeyValueStore::open(&path).unwrap();

    tab_a.set("board", "[1]").unwrap();
    assert!(tab_a.poll_changes().unwrap().is_empty());

    assert_eq!(
        tab_b.poll_changes().unwrap(),
        vec![StorageEvent::changed("board", "[1]")]
    );
    assert!(tab_b.poll_changes().unwrap().is_empty());

    tab_b.set("board", "[1,2]").unwrap();
    tab_b.set("theme", "\"dark\"").unwrap();
    assert_eq!(
        tab_a.poll_changes().unwrap(),
        vec![
            StorageEvent::changed("board", "[1,2]"),
            StorageEvent::changed("theme", "\"dark\""),
        ]
    );
}

#[test]
fn poll_reports_removal_and_recreation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");
    let mut tab_a = SqliteKeyValueStore::open(&path).unwrap();
    let mut tab_b = SqliteKeyValueStore::open(&path).unwrap();

    tab_a.set("board", "[1]").unwrap();
    tab_b.poll_changes().unwrap();

    tab_a.remove("board").unwrap();
    assert_eq!(
        tab_b.poll_changes().unwrap(),
        vec![StorageEvent::removed("board")]
    );

    tab_a.set("board", "[1]").unwrap();
    assert_eq!(
        tab_b.poll_changes().unwrap(),
        vec![StorageEvent::changed("board", "[1]")]
    );
}

#[test]
fn store_opened_after_write_does_not_replay_existing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.sqlite3");
    let mut writer = SqliteKeyValueStore::open(&path).unwrap();
    writer.set("board", "[]").unwrap();

    let mut late = SqliteKeyValueStore::open(&path).unwrap();
    assert!(late.poll_changes().unwrap().is_empty());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
