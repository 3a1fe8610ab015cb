//! Application-facing journal entry.
//!
//! # Responsibility
//! - Present emoji lists and fractional sleep hours to callers.
//! - Map losslessly enough to and from the storage [`Entry`].
//!
//! # Invariants
//! - Emoji lists are joined with `,` on write; a blank CSV reads back as an
//!   empty list.
//! - `sleep_hours <= 0` is stored as `NULL` minutes and reads back as `0.0`.

use crate::model::entry::{Entry, EntryId, UNASSIGNED_ENTRY_ID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const EMOJI_SEPARATOR: char = ',';

/// View model consumed by timeline/editor style callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub mood_emojis: Vec<String>,
    pub mood_rating: Option<i32>,
    pub toggle_x: bool,
    pub toggle_y: bool,
    pub toggle_z: bool,
    pub toggle_w: bool,
    /// Fractional hours; `0.0` when not recorded.
    pub sleep_hours: f32,
}

impl JournalEntry {
    /// Creates an unsaved journal entry stamped with the current time.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED_ENTRY_ID,
            created_at: Utc::now(),
            title: title.into(),
            body: body.into(),
            mood_emojis: Vec::new(),
            mood_rating: None,
            toggle_x: false,
            toggle_y: false,
            toggle_z: false,
            toggle_w: false,
            sleep_hours: 0.0,
        }
    }

    /// Builds the storage record for this entry.
    pub fn to_entry(&self) -> Entry {
        Entry {
            id: self.id,
            created_at: self.created_at,
            title: self.title.clone(),
            body: self.body.clone(),
            mood_rating: self.mood_rating,
            mood_emojis_csv: join_emojis(&self.mood_emojis),
            toggle_x: self.toggle_x,
            toggle_y: self.toggle_y,
            toggle_z: self.toggle_z,
            toggle_w: self.toggle_w,
            sleep_minutes: hours_to_minutes(self.sleep_hours),
        }
    }
}

impl From<Entry> for JournalEntry {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            created_at: entry.created_at,
            mood_emojis: split_emojis(&entry.mood_emojis_csv),
            title: entry.title,
            body: entry.body,
            mood_rating: entry.mood_rating,
            toggle_x: entry.toggle_x,
            toggle_y: entry.toggle_y,
            toggle_z: entry.toggle_z,
            toggle_w: entry.toggle_w,
            sleep_hours: minutes_to_hours(entry.sleep_minutes),
        }
    }
}

/// Joins emoji codes into the stored CSV form.
pub fn join_emojis(emojis: &[String]) -> String {
    emojis.join(",")
}

/// Splits the stored CSV form into trimmed emoji codes.
pub fn split_emojis(csv: &str) -> Vec<String> {
    if csv.trim().is_empty() {
        return Vec::new();
    }
    csv.split(EMOJI_SEPARATOR)
        .map(|part| part.trim().to_string())
        .collect()
}

fn hours_to_minutes(hours: f32) -> Option<i32> {
    if hours > 0.0 {
        Some((hours * 60.0).round() as i32)
    } else {
        None
    }
}

fn minutes_to_hours(minutes: Option<i32>) -> f32 {
    minutes.map_or(0.0, |value| value as f32 / 60.0)
}
