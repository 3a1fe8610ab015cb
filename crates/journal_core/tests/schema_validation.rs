use journal_core::db::schema::{schema_fingerprint, SCHEMA_VERSION};
use journal_core::db::{open_db, open_db_in_memory, open_db_with_config, DbConfig, DbError};
use journal_core::{CancellationToken, Entry, EntryRepository, SqliteEntryRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_schema() {
    let db = open_db_in_memory().unwrap();
    let conn = db.lock();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_table_exists(&conn, "entries");
    assert_table_exists(&conn, "schema_master");
    assert_eq!(stored_identity(&conn), schema_fingerprint().identity_hash);
}

#[test]
fn reopening_same_file_validates_and_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let first = open_db(&path).unwrap();
    let id = SqliteEntryRepository::new(first.clone())
        .upsert(&Entry::new("kept", "across reopen"))
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    let conn = second.lock();
    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    let title: String = conn
        .query_row("SELECT title FROM entries WHERE id = ?1;", [id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(title, "kept");
}

#[test]
fn renamed_column_fails_validation_with_both_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renamed.db");
    drop(open_db(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("ALTER TABLE entries RENAME COLUMN title TO headline;")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaMismatch {
            table,
            expected,
            found,
        } => {
            assert_eq!(table, "entries");
            assert!(expected.contains("name='title'"));
            assert!(found.contains("name='headline'"));
            assert!(!found.contains("name='title'"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nullability_drift_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nullable.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE `entries` (
            `id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            `createdAt` INTEGER NOT NULL,
            `title` TEXT NOT NULL,
            `body` TEXT,
            `moodRating` INTEGER,
            `moodEmojisCsv` TEXT NOT NULL,
            `toggleX` INTEGER NOT NULL,
            `toggleY` INTEGER NOT NULL,
            `toggleZ` INTEGER NOT NULL,
            `toggleW` INTEGER NOT NULL,
            `sleepMinutes` INTEGER
        );",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::SchemaMismatch { table: "entries", .. }));

    // The failed adoption must not stamp a version.
    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn matching_unversioned_table_is_adopted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("adopt.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            createdAt INT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            moodRating INTEGER,
            moodEmojisCsv VARCHAR(64) NOT NULL,
            toggleX INTEGER NOT NULL,
            toggleY INTEGER NOT NULL,
            toggleZ INTEGER NOT NULL,
            toggleW INTEGER NOT NULL,
            sleepMinutes INTEGER
        );",
    )
    .unwrap();
    drop(conn);

    let db = open_db(&path).unwrap();
    assert_eq!(schema_version(&db.lock()), SCHEMA_VERSION);
}

#[test]
fn identity_hash_mismatch_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("identity.db");
    drop(open_db(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE schema_master SET identity_hash = 'deadbeef' WHERE id = 1;",
        [],
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::IdentityMismatch { expected, found } => {
            assert_eq!(expected, schema_fingerprint().identity_hash);
            assert_eq!(found, "deadbeef");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_identity_hash_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    drop(open_db(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE schema_master SET identity_hash = ?1 WHERE id = 1;",
        [schema_fingerprint().legacy_hash],
    )
    .unwrap();
    drop(conn);

    let db = open_db(&path).unwrap();
    // Reopen rewrites the current identity.
    assert_eq!(stored_identity(&db.lock()), schema_fingerprint().identity_hash);
}

#[test]
fn missing_metadata_table_is_restored_after_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_master.db");
    drop(open_db(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("DROP TABLE schema_master;").unwrap();
    drop(conn);

    let db = open_db(&path).unwrap();
    let conn = db.lock();
    assert_table_exists(&conn, "schema_master");
    assert_eq!(stored_identity(&conn), schema_fingerprint().identity_hash);
}

#[test]
fn newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn negative_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("negative.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = -1;").unwrap();
    drop(conn);

    let config = DbConfig {
        destructive_reset_on_version_change: true,
        ..DbConfig::default()
    };
    let err = open_db_with_config(&path, &config).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion { db_version, .. } => assert_eq!(db_version, -1),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn adopting_unversioned_file_checks_stored_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign_identity.db");
    drop(open_db(&path).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "UPDATE schema_master SET identity_hash = 'deadbeef' WHERE id = 1;
         PRAGMA user_version = 0;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::IdentityMismatch { .. }));

    // The rejected adoption leaves the file untouched.
    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert_eq!(stored_identity(&conn), "deadbeef");
}

#[test]
fn config_defaults_are_applied_for_missing_fields() {
    let config: DbConfig = serde_json::from_str(r#"{ "wal": false }"#).unwrap();
    assert!(!config.wal);
    assert_eq!(config.busy_timeout_ms, DbConfig::default().busy_timeout_ms);
    assert!(!config.destructive_reset_on_version_change);
}

#[test]
fn file_database_uses_wal_unless_disabled() {
    let dir = tempfile::tempdir().unwrap();

    let wal = open_db(dir.path().join("wal.db")).unwrap();
    assert_eq!(journal_mode(&wal.lock()), "wal");

    let config = DbConfig {
        wal: false,
        ..DbConfig::default()
    };
    let plain = open_db_with_config(dir.path().join("plain.db"), &config).unwrap();
    assert_eq!(journal_mode(&plain.lock()), "delete");
}

#[tokio::test]
async fn reset_drops_entries_and_recreates_schema() {
    let db = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::new(db.clone());
    repo.upsert(&Entry::new("gone", "after reset")).unwrap();

    db.reset().unwrap();

    let remaining = repo.get_all_once(CancellationToken::new()).await.unwrap();
    assert!(remaining.is_empty());
    let conn = db.lock();
    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_eq!(stored_identity(&conn), schema_fingerprint().identity_hash);
}

#[tokio::test]
async fn clear_all_tables_removes_rows_and_keeps_id_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(dir.path().join("clear.db")).unwrap();
    let repo = SqliteEntryRepository::new(db.clone());
    let first = repo.upsert(&Entry::new("a", "")).unwrap();
    repo.upsert(&Entry::new("b", "")).unwrap();

    assert_eq!(db.clear_all_tables().unwrap(), 2);
    assert!(repo
        .get_all_once(CancellationToken::new())
        .await
        .unwrap()
        .is_empty());

    let next = repo.upsert(&Entry::new("c", "")).unwrap();
    assert!(next > first + 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn journal_mode(conn: &Connection) -> String {
    conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap()
}

fn stored_identity(conn: &Connection) -> String {
    conn.query_row(
        "SELECT identity_hash FROM schema_master WHERE id = 1;",
        [],
        |row| row.get(0),
    )
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
