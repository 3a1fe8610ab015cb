//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas and the prepared statement cache.
//! - Create or validate the schema before returning a usable handle.
//!
//! # Invariants
//! - Returned handles have a validated schema at `SCHEMA_VERSION`.
//! - A failed bootstrap never yields a handle.

use super::config::DbConfig;
use super::handle::JournalDb;
use super::schema::prepare_schema;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const MODE_FILE: &str = "file";
const MODE_MEMORY: &str = "memory";

/// Opens a journal database file with default configuration.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<JournalDb> {
    open_db_with_config(path, &DbConfig::default())
}

/// Opens a journal database file, creating it when missing.
///
/// # Side effects
/// - Creates or validates the schema.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with_config(path: impl AsRef<Path>, config: &DbConfig) -> DbResult<JournalDb> {
    open_with(MODE_FILE, config, || Connection::open(path))
}

/// Opens a fresh in-memory journal database.
///
/// # Side effects
/// - Creates the schema.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<JournalDb> {
    open_with(MODE_MEMORY, &DbConfig::default(), Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    config: &DbConfig,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<JournalDb> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, mode, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(JournalDb::new(conn, mode))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, mode: &str, config: &DbConfig) -> DbResult<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity);
    if config.wal && mode == MODE_FILE {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    let outcome = prepare_schema(conn, config)?;
    info!("event=schema_ready module=db status=ok mode={mode} outcome={outcome:?}");
    Ok(())
}
