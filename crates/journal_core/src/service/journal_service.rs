//! Journal use-case service.
//!
//! # Responsibility
//! - Provide journal entry CRUD and subscriptions in view-model form.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository transaction/notification contracts.
//! - Service layer remains storage-agnostic.

use crate::model::entry::EntryId;
use crate::model::journal_entry::JournalEntry;
use crate::repo::entry_repo::{EntryRepository, RepoResult};
use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

/// Use-case service wrapper for journal entries.
pub struct JournalService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> JournalService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Live, newest-first list of journal entries.
    ///
    /// Dropping the stream ends the subscription.
    pub fn observe_all(&self) -> BoxStream<'static, RepoResult<Vec<JournalEntry>>> {
        self.repo
            .observe_all()
            .map(|snapshot| snapshot.map(into_journal_entries))
            .boxed()
    }

    /// One newest-first snapshot of journal entries.
    pub fn get_all_once(
        &self,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, RepoResult<Vec<JournalEntry>>> {
        let read = self.repo.get_all_once(cancel);
        Box::pin(async move { read.await.map(into_journal_entries) })
    }

    /// Saves one entry. `id == 0` creates a new row.
    ///
    /// # Contract
    /// - Returns the assigned id for new entries, the same id otherwise.
    pub fn upsert(&self, entry: &JournalEntry) -> RepoResult<EntryId> {
        self.repo.upsert(&entry.to_entry())
    }

    /// Saves a batch of entries atomically.
    pub fn upsert_all(&self, entries: &[JournalEntry]) -> RepoResult<Vec<EntryId>> {
        let records: Vec<_> = entries.iter().map(JournalEntry::to_entry).collect();
        self.repo.upsert_all(&records)
    }

    pub fn clear_all(&self) -> RepoResult<()> {
        self.repo.clear_all()
    }

    pub fn delete_by_id(&self, id: EntryId) -> RepoResult<()> {
        self.repo.delete_by_id(id)
    }
}

fn into_journal_entries(entries: Vec<crate::model::entry::Entry>) -> Vec<JournalEntry> {
    entries.into_iter().map(JournalEntry::from).collect()
}
