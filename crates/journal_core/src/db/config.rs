//! Connection configuration.

use serde::Deserialize;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATEMENT_CACHE_CAPACITY: usize = 16;

/// Options applied when opening a journal database.
///
/// Deserializable so hosts can embed it in their own settings files; missing
/// fields fall back to [`DbConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Capacity of the per-connection prepared statement cache.
    pub statement_cache_capacity: usize,
    /// Switch file databases to write-ahead logging. Ignored in memory.
    pub wal: bool,
    /// Drop and recreate the schema when an older `user_version` is found.
    ///
    /// Off by default: no migrations exist, so the only alternative to a
    /// fatal error is losing every stored entry.
    pub destructive_reset_on_version_change: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            statement_cache_capacity: DEFAULT_STATEMENT_CACHE_CAPACITY,
            wal: true,
            destructive_reset_on_version_change: false,
        }
    }
}
