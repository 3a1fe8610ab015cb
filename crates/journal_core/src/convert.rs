//! Column type converters.
//!
//! # Responsibility
//! - Map domain values to the integer representations stored in SQLite.
//! - Map stored integers back to domain values.
//!
//! # Invariants
//! - Timestamp conversions preserve `None` in both directions.
//! - Timestamps are stored as whole epoch seconds; sub-second precision is
//!   truncated on write.
//! - Booleans are stored as exactly `0` or `1`.

use chrono::{DateTime, Utc};

/// Converts stored epoch seconds into a UTC timestamp.
///
/// Returns `None` for `None` input and for values outside chrono's range.
pub fn epoch_seconds_to_timestamp(epoch_seconds: Option<i64>) -> Option<DateTime<Utc>> {
    epoch_seconds.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Converts a UTC timestamp into epoch seconds for storage.
pub fn timestamp_to_epoch_seconds(timestamp: Option<DateTime<Utc>>) -> Option<i64> {
    timestamp.map(|value| value.timestamp())
}

pub fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Decodes a stored flag. Anything other than `0`/`1` is rejected.
pub fn int_to_bool(value: i64) -> Option<bool> {
    match value {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}
