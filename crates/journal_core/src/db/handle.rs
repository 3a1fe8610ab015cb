//! Shared database handle.
//!
//! # Responsibility
//! - Own the single SQLite connection and its invalidation tracker.
//! - Hand out serialized access to the connection.
//!
//! # Invariants
//! - Exactly one connection exists per handle; clones share it.
//! - Every mutation made through the handle publishes a table change after
//!   commit.

use super::invalidation::InvalidationTracker;
use super::schema::{self, ENTRIES_TABLE};
use super::DbResult;
use log::info;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;

/// Cloneable handle to an opened, schema-validated journal database.
///
/// Constructed explicitly through `open_db*` and passed to repositories;
/// there is no process-wide instance.
#[derive(Clone)]
pub struct JournalDb {
    inner: Arc<DbInner>,
}

struct DbInner {
    conn: Mutex<Connection>,
    tracker: InvalidationTracker,
    mode: &'static str,
}

impl JournalDb {
    pub(crate) fn new(conn: Connection, mode: &'static str) -> Self {
        Self {
            inner: Arc::new(DbInner {
                conn: Mutex::new(conn),
                tracker: InvalidationTracker::new(),
                mode,
            }),
        }
    }

    /// Locks the shared connection for the duration of the guard.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.inner.conn.lock()
    }

    pub fn tracker(&self) -> &InvalidationTracker {
        &self.inner.tracker
    }

    /// `"file"` or `"memory"`, for diagnostics.
    pub fn mode(&self) -> &'static str {
        self.inner.mode
    }

    /// Deletes every entry and runs WAL checkpoint + vacuum maintenance.
    ///
    /// Returns the number of rows removed.
    pub fn clear_all_tables(&self) -> DbResult<usize> {
        let started_at = Instant::now();
        let removed = {
            let mut conn = self.lock();
            schema::clear_all_tables(&mut conn)?
        };
        self.tracker().notify(ENTRIES_TABLE);
        info!(
            "event=tables_clear module=db status=ok mode={} rows={removed} duration_ms={}",
            self.mode(),
            started_at.elapsed().as_millis()
        );
        Ok(removed)
    }

    /// Drops and recreates the schema. All stored entries are lost.
    pub fn reset(&self) -> DbResult<()> {
        {
            let mut conn = self.lock();
            schema::reset_schema(&mut conn)?;
        }
        self.tracker().notify(ENTRIES_TABLE);
        Ok(())
    }
}

impl std::fmt::Debug for JournalDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalDb")
            .field("mode", &self.inner.mode)
            .field("subscribers", &self.inner.tracker.subscriber_count())
            .finish()
    }
}
