//! Journal domain model.
//!
//! # Responsibility
//! - Define the storage record persisted in the `entries` table.
//! - Define the application-facing view model and its mapping.
//!
//! # Invariants
//! - Every persisted entry is identified by an engine-assigned `EntryId`.
//! - `EntryId` value `0` means "not yet persisted".

pub mod entry;
pub mod journal_entry;
