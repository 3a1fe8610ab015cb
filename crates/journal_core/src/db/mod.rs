//! SQLite storage bootstrap, schema management and change notification.
//!
//! # Responsibility
//! - Open and configure the single shared SQLite connection.
//! - Create, fingerprint and validate the `entries` schema.
//! - Publish table-changed events to live readers.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write entries before schema validation succeeds.
//! - A schema mismatch is fatal; there is no silent upgrade path.

pub mod config;
mod handle;
pub mod invalidation;
mod open;
pub mod schema;
pub mod table_info;

pub use config::DbConfig;
pub use handle::JournalDb;
pub use invalidation::{InvalidationTracker, TableChange};
pub use open::{open_db, open_db_in_memory, open_db_with_config};

use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is not supported (latest supported {latest_supported})")]
    UnsupportedSchemaVersion { db_version: i64, latest_supported: u32 },
    #[error(
        "database schema version {db_version} requires a migration to {latest_supported}, \
         but none is defined"
    )]
    MigrationRequired { db_version: u32, latest_supported: u32 },
    #[error("schema validation failed for table `{table}`.\n Expected:\n{expected}\n Found:\n{found}")]
    SchemaMismatch {
        table: &'static str,
        expected: String,
        found: String,
    },
    #[error("schema identity hash mismatch: expected `{expected}`, found `{found}`")]
    IdentityMismatch { expected: String, found: String },
}
