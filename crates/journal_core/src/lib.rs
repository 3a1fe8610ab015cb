//! Core persistence layer for the journal app.
//! This crate owns the `entries` table, its schema and its live queries.

pub mod convert;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, open_db_with_config, DbConfig, DbError, JournalDb};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{Entry, EntryId, UNASSIGNED_ENTRY_ID};
pub use model::journal_entry::JournalEntry;
pub use repo::entry_repo::{EntryRepository, ReadMode, RepoError, RepoResult, SqliteEntryRepository};
pub use service::journal_service::JournalService;
pub use tokio_util::sync::CancellationToken;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
