//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for journal entries.
//! - Isolate SQLite statements and row decoding from service orchestration.
//!
//! # Invariants
//! - Repository writes publish a table change only after commit.
//! - Repository reads return semantic errors (`InvalidData`, `Cancelled`) in
//!   addition to DB transport errors.

pub mod entry_repo;
