//! Table-changed notification.
//!
//! # Responsibility
//! - Let writers publish "table X changed" after their transaction commits.
//! - Let live readers subscribe to those events.
//!
//! # Invariants
//! - Events are published only after commit, never from inside a
//!   transaction.
//! - Publishing never blocks and never fails when nobody is listening.

use log::trace;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// One committed mutation of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChange {
    pub table: &'static str,
}

/// Broadcast hub shared by every writer and subscriber of one database.
///
/// Slow subscribers may observe `RecvError::Lagged`; since every event means
/// "re-read the table", a lagged subscriber only needs one re-read.
#[derive(Debug, Clone)]
pub struct InvalidationTracker {
    sender: broadcast::Sender<TableChange>,
}

impl InvalidationTracker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes a committed change of `table`.
    pub fn notify(&self, table: &'static str) {
        // A send error only means there are no subscribers right now.
        let receivers = self.sender.send(TableChange { table }).unwrap_or(0);
        trace!("event=table_invalidated module=db table={table} receivers={receivers}");
    }

    /// Registers a new listener that sees every change published afterwards.
    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InvalidationTracker {
    fn default() -> Self {
        Self::new()
    }
}
