//! Entry repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert/delete/clear mutations over the `entries` table.
//! - Provide live and snapshot reads through one decoding path.
//! - Publish table changes after every committed mutation.
//!
//! # Invariants
//! - Every mutation runs inside exactly one transaction.
//! - Reads order by `createdAt DESC, id DESC`.
//! - Read paths reject NULL in required columns instead of masking it.

use crate::convert::{bool_to_int, epoch_seconds_to_timestamp, int_to_bool, timestamp_to_epoch_seconds};
use crate::db::schema::ENTRIES_TABLE;
use crate::db::{DbError, JournalDb};
use crate::model::entry::{Entry, EntryId};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use rusqlite::{params, Connection, ErrorCode, Row, Transaction};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO `entries` (
    `id`,
    `createdAt`,
    `title`,
    `body`,
    `moodRating`,
    `moodEmojisCsv`,
    `toggleX`,
    `toggleY`,
    `toggleZ`,
    `toggleW`,
    `sleepMinutes`
) VALUES (nullif(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

const DELETE_ALL_SQL: &str = "DELETE FROM entries";
const DELETE_BY_ID_SQL: &str = "DELETE FROM entries WHERE id = ?1";
const SELECT_ALL_SQL: &str = "SELECT * FROM entries ORDER BY createdAt DESC, id DESC";

/// SQLite VM instructions between cancellation checks of a snapshot read.
const CANCEL_CHECK_INTERVAL_OPS: i32 = 1_000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("invalid persisted entry data: {0}")]
    InvalidData(String),
    #[error("entry read cancelled")]
    Cancelled,
    #[error("entry read worker failed: {0}")]
    Worker(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// How a read is performed.
///
/// Both modes share the same statement and decoder; they differ only in how
/// the read can be abandoned.
#[derive(Debug, Clone)]
pub enum ReadMode {
    /// Re-run on every table change; abandoned by dropping the subscription.
    Live,
    /// One-shot read; abandoned by cancelling the token.
    Snapshot(CancellationToken),
}

/// Repository interface for entry data access.
pub trait EntryRepository {
    /// Inserts or replaces one entry and returns its id.
    fn upsert(&self, entry: &Entry) -> RepoResult<EntryId>;
    /// Inserts or replaces a batch atomically and returns ids in input order.
    fn upsert_all(&self, entries: &[Entry]) -> RepoResult<Vec<EntryId>>;
    /// Deletes every entry.
    fn clear_all(&self) -> RepoResult<()>;
    /// Deletes one entry; a missing id is not an error.
    fn delete_by_id(&self, id: EntryId) -> RepoResult<()>;
    /// Emits the full ordered list now and after every committed change.
    fn observe_all(&self) -> BoxStream<'static, RepoResult<Vec<Entry>>>;
    /// Reads the full ordered list once; cancellable through `cancel`.
    fn get_all_once(&self, cancel: CancellationToken) -> BoxFuture<'static, RepoResult<Vec<Entry>>>;
}

/// SQLite-backed entry repository over a shared [`JournalDb`].
#[derive(Debug, Clone)]
pub struct SqliteEntryRepository {
    db: JournalDb,
}

impl SqliteEntryRepository {
    pub fn new(db: JournalDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &JournalDb {
        &self.db
    }

    /// Runs `work` in one transaction and publishes a change when it reports
    /// affected rows.
    fn write<T>(
        &self,
        event: &str,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<(T, usize)>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let (value, changed) = {
            let mut conn = self.db.lock();
            let tx = conn.transaction()?;
            let outcome = match work(&tx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        "event={event} module=repo status=error duration_ms={} error={err}",
                        started_at.elapsed().as_millis()
                    );
                    // Dropping `tx` rolls back.
                    return Err(err);
                }
            };
            tx.commit()?;
            outcome
        };

        if changed > 0 {
            self.db.tracker().notify(ENTRIES_TABLE);
        }
        debug!(
            "event={event} module=repo status=ok rows={changed} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(value)
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn upsert(&self, entry: &Entry) -> RepoResult<EntryId> {
        self.write("entries_upsert", |tx| {
            let id = insert_entry(tx, entry)?;
            Ok((id, 1))
        })
    }

    fn upsert_all(&self, entries: &[Entry]) -> RepoResult<Vec<EntryId>> {
        self.write("entries_upsert_all", |tx| {
            let mut ids = Vec::with_capacity(entries.len());
            for entry in entries {
                ids.push(insert_entry(tx, entry)?);
            }
            let count = ids.len();
            Ok((ids, count))
        })
    }

    fn clear_all(&self) -> RepoResult<()> {
        self.write("entries_clear", |tx| {
            let removed = tx.prepare_cached(DELETE_ALL_SQL)?.execute([])?;
            Ok(((), removed))
        })
    }

    fn delete_by_id(&self, id: EntryId) -> RepoResult<()> {
        self.write("entries_delete", |tx| {
            let removed = tx.prepare_cached(DELETE_BY_ID_SQL)?.execute([id])?;
            Ok(((), removed))
        })
    }

    fn observe_all(&self) -> BoxStream<'static, RepoResult<Vec<Entry>>> {
        let db = self.db.clone();
        // Subscribe before the first read so no commit can slip in between.
        let mut changes = db.tracker().subscribe();
        info!("event=entries_observe module=repo status=start");

        Box::pin(async_stream::stream! {
            loop {
                let read_db = db.clone();
                let read = tokio::task::spawn_blocking(move || {
                    let conn = read_db.lock();
                    read_entries(&conn, &ReadMode::Live)
                });
                let snapshot = match read.await {
                    Ok(snapshot) => snapshot,
                    Err(err) => Err(RepoError::Worker(err.to_string())),
                };
                yield snapshot;

                if !wait_for_change(&mut changes).await {
                    debug!("event=entries_observe module=repo status=closed");
                    break;
                }
            }
        })
    }

    fn get_all_once(&self, cancel: CancellationToken) -> BoxFuture<'static, RepoResult<Vec<Entry>>> {
        let db = self.db.clone();
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(RepoError::Cancelled);
            }

            let mode = ReadMode::Snapshot(cancel.clone());
            let read = tokio::task::spawn_blocking(move || {
                let conn = db.lock();
                read_entries(&conn, &mode)
            });

            tokio::select! {
                joined = read => joined.map_err(|err| RepoError::Worker(err.to_string()))?,
                // The worker observes the same token and stops on its own.
                () = cancel.cancelled() => Err(RepoError::Cancelled),
            }
        })
    }
}

/// Waits until `entries` changes. Returns `false` once the tracker is gone.
///
/// Notifications already queued behind the first one are drained so a burst
/// of writes costs a single re-read.
async fn wait_for_change(
    changes: &mut tokio::sync::broadcast::Receiver<crate::db::TableChange>,
) -> bool {
    loop {
        match changes.recv().await {
            Ok(change) if change.table == ENTRIES_TABLE => break,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                debug!("event=entries_observe module=repo status=lagged skipped={skipped}");
                break;
            }
            Err(RecvError::Closed) => return false,
        }
    }

    loop {
        match changes.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Closed) => return false,
        }
    }
}

fn insert_entry(conn: &Connection, entry: &Entry) -> RepoResult<EntryId> {
    let mut stmt = conn.prepare_cached(UPSERT_SQL)?;
    let id = stmt.insert(params![
        entry.id,
        timestamp_to_epoch_seconds(Some(entry.created_at)),
        entry.title.as_str(),
        entry.body.as_str(),
        entry.mood_rating,
        entry.mood_emojis_csv.as_str(),
        bool_to_int(entry.toggle_x),
        bool_to_int(entry.toggle_y),
        bool_to_int(entry.toggle_z),
        bool_to_int(entry.toggle_w),
        entry.sleep_minutes,
    ])?;
    Ok(id)
}

/// Shared read path for live and snapshot queries.
pub(crate) fn read_entries(conn: &Connection, mode: &ReadMode) -> RepoResult<Vec<Entry>> {
    match mode {
        ReadMode::Live => query_entries(conn, None),
        ReadMode::Snapshot(cancel) => {
            let guard = AssertUnwindSafe(cancel.clone());
            conn.progress_handler(
                CANCEL_CHECK_INTERVAL_OPS,
                Some(move || guard.is_cancelled()),
            );
            let result = query_entries(conn, Some(cancel));
            conn.progress_handler(CANCEL_CHECK_INTERVAL_OPS, None::<fn() -> bool>);
            result
        }
    }
}

fn query_entries(conn: &Connection, cancel: Option<&CancellationToken>) -> RepoResult<Vec<Entry>> {
    let is_cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);
    if is_cancelled() {
        return Err(RepoError::Cancelled);
    }

    let mut stmt = conn.prepare_cached(SELECT_ALL_SQL)?;
    let mut rows = stmt.query([])?;
    let mut entries = Vec::new();
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(err) if is_interrupted(&err) && is_cancelled() => {
                return Err(RepoError::Cancelled)
            }
            Err(err) => return Err(err.into()),
        };
        entries.push(parse_entry_row(row)?);
        if is_cancelled() {
            return Err(RepoError::Cancelled);
        }
    }
    Ok(entries)
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::OperationInterrupted
    )
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let created_epoch: Option<i64> = row.get("createdAt")?;
    let created_at = epoch_seconds_to_timestamp(created_epoch).ok_or_else(|| {
        RepoError::InvalidData(match created_epoch {
            None => "expected non-null value in entries.createdAt".to_string(),
            Some(value) => format!("out of range timestamp `{value}` in entries.createdAt"),
        })
    })?;

    Ok(Entry {
        id: row.get("id")?,
        created_at,
        title: required_text(row, "title")?,
        body: required_text(row, "body")?,
        mood_rating: row.get("moodRating")?,
        mood_emojis_csv: required_text(row, "moodEmojisCsv")?,
        toggle_x: required_flag(row, "toggleX")?,
        toggle_y: required_flag(row, "toggleY")?,
        toggle_z: required_flag(row, "toggleZ")?,
        toggle_w: required_flag(row, "toggleW")?,
        sleep_minutes: row.get("sleepMinutes")?,
    })
}

fn required_text(row: &Row<'_>, column: &str) -> RepoResult<String> {
    row.get::<_, Option<String>>(column)?.ok_or_else(|| {
        RepoError::InvalidData(format!("expected non-null value in entries.{column}"))
    })
}

fn required_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    let value = row.get::<_, Option<i64>>(column)?.ok_or_else(|| {
        RepoError::InvalidData(format!("expected non-null value in entries.{column}"))
    })?;
    int_to_bool(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid flag value `{value}` in entries.{column}"))
    })
}
