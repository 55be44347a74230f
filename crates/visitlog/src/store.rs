//! The record store.
//!
//! [`RecordStore`] owns the newest-first entry collection and writes the
//! whole collection through its [`StorageBackend`] after every mutation.
//! Memory is always updated first, so a failed write leaves the in-memory
//! collection authoritative until the next successful one.

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::autofill::{self, Prefill};
use crate::entry::{Entry, EntryId, EntrySchema, IdGenerator, NewEntry};
use crate::error::{Error, Result};
use crate::filter::EntryQuery;
use crate::storage::{ExportReceipt, StorageBackend};

/// What [`RecordStore::load`] found.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Entries were read from the backend.
    Loaded(usize),
    /// The backend had nothing stored.
    Empty,
    /// The backend failed; the store continues empty.
    Recovered(Error),
}

/// Ordered entry collection bound to a storage backend.
#[derive(Debug)]
pub struct RecordStore {
    entries: Vec<Entry>,
    backend: Box<dyn StorageBackend>,
    schema: EntrySchema,
    ids: IdGenerator,
}

impl RecordStore {
    /// Create an empty store. Nothing is read until [`Self::load`].
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, schema: EntrySchema) -> Self {
        Self {
            entries: Vec::new(),
            backend,
            schema,
            ids: IdGenerator::new(),
        }
    }

    /// Create a store and load it from the backend.
    pub async fn open(backend: Box<dyn StorageBackend>, schema: EntrySchema) -> (Self, LoadOutcome) {
        let mut store = Self::new(backend, schema);
        let outcome = store.load().await;
        (store, outcome)
    }

    /// Replace the in-memory collection with what the backend holds.
    ///
    /// Never fails: a backend error is logged and returned in the outcome,
    /// and the store is left empty.
    pub async fn load(&mut self) -> LoadOutcome {
        match self.backend.load_entries().await {
            Ok(entries) if entries.is_empty() => {
                self.entries.clear();
                debug!(backend = self.backend.name(), "No stored entries");
                LoadOutcome::Empty
            }
            Ok(entries) => {
                self.ids.observe(entries.iter().map(|e| &e.id));
                self.entries = entries;
                debug!(
                    backend = self.backend.name(),
                    count = self.entries.len(),
                    "Loaded entries"
                );
                LoadOutcome::Loaded(self.entries.len())
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "Starting with an empty store");
                self.entries.clear();
                LoadOutcome::Recovered(e)
            }
        }
    }

    /// All entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry with the given id.
    #[must_use]
    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// The schema submissions and imports are checked against.
    #[must_use]
    pub fn schema(&self) -> EntrySchema {
        self.schema
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Record a new entry stamped with the current local time.
    ///
    /// # Errors
    ///
    /// See [`Self::add_at`].
    pub async fn add(&mut self, new: NewEntry) -> Result<Entry> {
        self.add_at(new, Local::now()).await
    }

    /// Record a new entry stamped with `at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if required fields are missing, and
    /// [`Error::Internal`] if no id can follow the existing ones; in both
    /// cases nothing changes. Returns [`Error::SaveFailure`] if the write
    /// fails; the entry is kept in memory.
    pub async fn add_at(&mut self, new: NewEntry, at: DateTime<Local>) -> Result<Entry> {
        self.schema.validate(&new)?;

        let id = self.ids.next_id(at.timestamp_millis())?;
        let entry = Entry::from_new(id, new, &at);
        self.entries.insert(0, entry.clone());
        info!(id = %entry.id, "Entry added");

        self.persist().await?;
        Ok(entry)
    }

    /// Delete the entry with the given id.
    ///
    /// Returns the removed entry, or `None` if no entry matched. The backend
    /// is only written when something was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveFailure`] if the write fails.
    pub async fn remove(&mut self, id: &EntryId) -> Result<Option<Entry>> {
        let Some(index) = self.entries.iter().position(|e| &e.id == id) else {
            debug!(%id, "Nothing to remove");
            return Ok(None);
        };
        let removed = self.entries.remove(index);
        info!(%id, "Entry removed");

        self.persist().await?;
        Ok(Some(removed))
    }

    /// Substitute the whole collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveFailure`] if the write fails.
    pub async fn replace_all(&mut self, entries: Vec<Entry>) -> Result<()> {
        self.ids.observe(entries.iter().map(|e| &e.id));
        self.entries = entries;
        info!(count = self.entries.len(), "Entries replaced");
        self.persist().await
    }

    /// Import a document through the backend and make it the collection.
    ///
    /// Returns the number of imported entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImportFailure`] if the file is missing, unreadable or
    /// fails schema validation; the store is unchanged. Returns
    /// [`Error::SaveFailure`] if the imported set cannot be written.
    pub async fn import_from(&mut self, source: &Path) -> Result<usize> {
        let entries = self.backend.import_data(source).await?;
        self.schema
            .validate_all(&entries)
            .map_err(|message| Error::import_failure(source, message))?;

        let count = entries.len();
        self.replace_all(entries).await?;
        Ok(count)
    }

    /// Export the collection through the backend.
    ///
    /// The current collection is written first so the export reflects it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExportFailure`] if either step fails.
    pub async fn export_to(&self, dest: &Path) -> Result<ExportReceipt> {
        self.persist()
            .await
            .map_err(|e| Error::export_failure(dest, e.to_string()))?;
        let receipt = self.backend.export_data(dest).await?;
        info!(path = %receipt.path.display(), count = receipt.count, "Entries exported");
        Ok(receipt)
    }

    /// Entries matching `query`, newest first.
    #[must_use]
    pub fn query(&self, query: &EntryQuery) -> Vec<&Entry> {
        query.apply(&self.entries)
    }

    /// Prefill from the most recent entry with this identifier.
    #[must_use]
    pub fn prefill_for(&self, identifier: &str) -> Option<Prefill> {
        autofill::resolve(&self.entries, identifier)
    }

    async fn persist(&self) -> Result<()> {
        debug!(
            backend = self.backend.name(),
            count = self.entries.len(),
            "Writing entries"
        );
        self.backend.save_entries(&self.entries).await
    }
}
