//! Schema creation, fingerprinting and validation for the `entries` table.
//!
//! # Responsibility
//! - Create all tables on first open and stamp the schema identity.
//! - Validate the live schema on every open and reject drift.
//! - Provide destructive reset and post-clear maintenance paths.
//!
//! # Invariants
//! - `schema_master` holds exactly one row (`id = 1`).
//! - `PRAGMA user_version` equals [`SCHEMA_VERSION`] after a successful
//!   bootstrap.
//! - No migrations exist: an older version is fatal unless the caller opted
//!   into destructive reset.

use super::config::DbConfig;
use super::table_info::{ColumnInfo, TableInfo};
use super::{DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

/// Schema version mirrored to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const ENTRIES_TABLE: &str = "entries";
pub const SCHEMA_MASTER_TABLE: &str = "schema_master";

const SCHEMA_MASTER_ROW_ID: i64 = 1;
const IDENTITY_HASH_LEN: usize = 32;

const CREATE_ENTRIES_SQL: &str = "CREATE TABLE IF NOT EXISTS `entries` (\
`id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
`createdAt` INTEGER NOT NULL, \
`title` TEXT NOT NULL, \
`body` TEXT NOT NULL, \
`moodRating` INTEGER, \
`moodEmojisCsv` TEXT NOT NULL, \
`toggleX` INTEGER NOT NULL, \
`toggleY` INTEGER NOT NULL, \
`toggleZ` INTEGER NOT NULL, \
`toggleW` INTEGER NOT NULL, \
`sleepMinutes` INTEGER)";

const CREATE_SCHEMA_MASTER_SQL: &str = "CREATE TABLE IF NOT EXISTS schema_master (\
id INTEGER PRIMARY KEY, \
identity_hash TEXT NOT NULL, \
legacy_hash TEXT NOT NULL)";

/// Expected identity of the schema compiled into this binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFingerprint {
    /// Hash of the canonical create statement.
    pub identity_hash: String,
    /// Hash of the expected column description; accepted as an alias.
    pub legacy_hash: String,
}

/// What bootstrap did to reach a valid schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    Validated,
    Reset,
}

/// Returns the expected `entries` definition.
pub fn expected_entries_table() -> TableInfo {
    TableInfo::new(
        ENTRIES_TABLE,
        [
            ColumnInfo::new("id", "INTEGER", true, 1),
            ColumnInfo::new("createdAt", "INTEGER", true, 0),
            ColumnInfo::new("title", "TEXT", true, 0),
            ColumnInfo::new("body", "TEXT", true, 0),
            ColumnInfo::new("moodRating", "INTEGER", false, 0),
            ColumnInfo::new("moodEmojisCsv", "TEXT", true, 0),
            ColumnInfo::new("toggleX", "INTEGER", true, 0),
            ColumnInfo::new("toggleY", "INTEGER", true, 0),
            ColumnInfo::new("toggleZ", "INTEGER", true, 0),
            ColumnInfo::new("toggleW", "INTEGER", true, 0),
            ColumnInfo::new("sleepMinutes", "INTEGER", false, 0),
        ],
    )
}

/// Computes the fingerprint of the expected schema.
pub fn schema_fingerprint() -> SchemaFingerprint {
    SchemaFingerprint {
        identity_hash: short_hash(CREATE_ENTRIES_SQL),
        legacy_hash: short_hash(&expected_entries_table().to_string()),
    }
}

/// Brings the connection to a validated schema or fails.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build
///   or carries a version outside the valid range.
/// - `MigrationRequired` for an older version without destructive reset.
/// - `SchemaMismatch` / `IdentityMismatch` when the live schema drifted.
pub fn prepare_schema(conn: &mut Connection, config: &DbConfig) -> DbResult<SchemaOutcome> {
    prepare_schema_for(conn, config, SCHEMA_VERSION)
}

/// Bootstrap against an explicit supported version.
pub(crate) fn prepare_schema_for(
    conn: &mut Connection,
    config: &DbConfig,
    latest_supported: u32,
) -> DbResult<SchemaOutcome> {
    let version = current_user_version(conn, latest_supported)?;

    if version > latest_supported {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: i64::from(version),
            latest_supported,
        });
    }

    if version == 0 {
        create_schema(conn, latest_supported)?;
        return Ok(SchemaOutcome::Created);
    }

    if version < latest_supported {
        if !config.destructive_reset_on_version_change {
            return Err(DbError::MigrationRequired {
                db_version: version,
                latest_supported,
            });
        }
        warn!(
            "event=schema_reset module=db status=start reason=version_change from_version={version} to_version={latest_supported}"
        );
        reset_schema_to(conn, latest_supported)?;
        return Ok(SchemaOutcome::Reset);
    }

    check_identity(conn)?;
    validate_schema(conn)?;
    write_identity(conn)?;
    info!("event=schema_validate module=db status=ok version={version}");
    Ok(SchemaOutcome::Validated)
}

/// Compares the live `entries` table with the expected definition.
pub fn validate_schema(conn: &Connection) -> DbResult<()> {
    let expected = expected_entries_table();
    let found = TableInfo::read(conn, ENTRIES_TABLE)?;
    if expected != found {
        warn!("event=schema_validate module=db status=error table={ENTRIES_TABLE}");
        return Err(DbError::SchemaMismatch {
            table: ENTRIES_TABLE,
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

/// Drops every table and recreates the schema from scratch.
///
/// All stored entries are lost.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    reset_schema_to(conn, SCHEMA_VERSION)
}

fn reset_schema_to(conn: &mut Connection, version: u32) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        "DROP TABLE IF EXISTS `entries`;
         DROP TABLE IF EXISTS schema_master;",
    )?;
    create_all_tables(&tx, version)?;
    tx.commit()?;
    info!("event=schema_reset module=db status=ok version={version}");
    Ok(())
}

/// Deletes every entry, then checkpoints the WAL and reclaims free pages.
pub fn clear_all_tables(conn: &mut Connection) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let removed = tx.execute("DELETE FROM `entries`;", [])?;
    tx.commit()?;
    compact(conn)?;
    Ok(removed)
}

/// Checkpoints the write-ahead log and vacuums when no transaction is open.
pub fn compact(conn: &Connection) -> DbResult<()> {
    // Returns (busy, log_frames, checkpointed_frames); only success matters.
    conn.query_row("PRAGMA wal_checkpoint(FULL);", [], |_| Ok(()))?;
    if conn.is_autocommit() {
        conn.execute_batch("VACUUM;")?;
    }
    Ok(())
}

fn create_schema(conn: &mut Connection, version: u32) -> DbResult<()> {
    let had_user_tables = has_user_tables(conn)?;
    let tx = conn.transaction()?;
    if had_user_tables {
        // A pre-existing file without our version stamp must already match.
        check_identity(&tx)?;
    }
    create_all_tables(&tx, version)?;
    if had_user_tables {
        validate_schema(&tx)?;
    }
    tx.commit()?;
    info!(
        "event=schema_create module=db status=ok version={version} adopted_existing={had_user_tables}"
    );
    Ok(())
}

fn create_all_tables(conn: &Connection, version: u32) -> DbResult<()> {
    conn.execute_batch(CREATE_ENTRIES_SQL)?;
    conn.execute_batch(CREATE_SCHEMA_MASTER_SQL)?;
    write_identity(conn)?;
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

fn check_identity(conn: &Connection) -> DbResult<()> {
    if !table_exists(conn, SCHEMA_MASTER_TABLE)? {
        return Ok(());
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT identity_hash FROM schema_master WHERE id = ?1;",
            [SCHEMA_MASTER_ROW_ID],
            |row| row.get(0),
        )
        .optional()?;

    let Some(found) = stored else {
        return Ok(());
    };

    let fingerprint = schema_fingerprint();
    if found != fingerprint.identity_hash && found != fingerprint.legacy_hash {
        return Err(DbError::IdentityMismatch {
            expected: fingerprint.identity_hash,
            found,
        });
    }
    Ok(())
}

fn write_identity(conn: &Connection) -> DbResult<()> {
    let fingerprint = schema_fingerprint();
    conn.execute_batch(CREATE_SCHEMA_MASTER_SQL)?;
    conn.execute(
        "INSERT OR REPLACE INTO schema_master (id, identity_hash, legacy_hash)
         VALUES (?1, ?2, ?3);",
        rusqlite::params![
            SCHEMA_MASTER_ROW_ID,
            fingerprint.identity_hash,
            fingerprint.legacy_hash
        ],
    )?;
    Ok(())
}

fn current_user_version(conn: &Connection, latest_supported: u32) -> DbResult<u32> {
    let raw: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    u32::try_from(raw).map_err(|_| DbError::UnsupportedSchemaVersion {
        db_version: raw,
        latest_supported,
    })
}

fn has_user_tables(conn: &Connection) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        );",
        [],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    hex.truncate(IDENTITY_HASH_LEN);
    hex
}
