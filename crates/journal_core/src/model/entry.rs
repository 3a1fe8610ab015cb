//! Entry storage record.
//!
//! # Responsibility
//! - Hold one row of the `entries` table in typed form.
//!
//! # Invariants
//! - `id == 0` asks the storage engine to assign a fresh id on upsert.
//! - `created_at` is always present once persisted.
//! - `mood_emojis_csv` holds comma-joined emoji codes, possibly empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary key of an `entries` row.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntryId = i64;

/// Id value that requests auto-assignment on upsert.
pub const UNASSIGNED_ENTRY_ID: EntryId = 0;

/// One journal record as stored in SQLite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Engine-assigned primary key, or `0` before first upsert.
    pub id: EntryId,
    /// Creation instant; stored as epoch seconds.
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    /// Optional self-reported mood score.
    pub mood_rating: Option<i32>,
    /// Comma-joined emoji codes, e.g. `"😀,😴"`.
    pub mood_emojis_csv: String,
    pub toggle_x: bool,
    pub toggle_y: bool,
    pub toggle_z: bool,
    pub toggle_w: bool,
    /// Sleep duration in whole minutes, when recorded.
    pub sleep_minutes: Option<i32>,
}

impl Entry {
    /// Creates an unsaved entry stamped with the current time.
    ///
    /// # Invariants
    /// - `id` starts as [`UNASSIGNED_ENTRY_ID`].
    /// - Optional fields start as `None`, toggles as `false`.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::with_created_at(Utc::now(), title, body)
    }

    /// Creates an unsaved entry with a caller-provided creation instant.
    ///
    /// Used by import paths and tests that need deterministic ordering.
    pub fn with_created_at(
        created_at: DateTime<Utc>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: UNASSIGNED_ENTRY_ID,
            created_at,
            title: title.into(),
            body: body.into(),
            mood_rating: None,
            mood_emojis_csv: String::new(),
            toggle_x: false,
            toggle_y: false,
            toggle_z: false,
            toggle_w: false,
            sleep_minutes: None,
        }
    }

    /// Returns whether this entry has been assigned a storage id.
    pub fn is_persisted(&self) -> bool {
        self.id != UNASSIGNED_ENTRY_ID
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new("", "")
    }
}
