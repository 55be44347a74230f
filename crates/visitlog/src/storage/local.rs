//! Local key-value backend.
//!
//! A string-to-string store kept in a `SQLite` file. Entries are stored as
//! the pretty-printed JSON document under [`ENTRIES_KEY`], the same shape an
//! export file has.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::schema::SCHEMA_STATEMENTS;
use super::{ExportReceipt, StorageBackend};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::export::document;

/// Key under which the entry collection is stored.
pub const ENTRIES_KEY: &str = "entryMonitoring";

const BACKEND_NAME: &str = "local";

/// Key-value store backed by `SQLite`.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl LocalStore {
    /// Open or create a local store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening local store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        initialize_schema(&conn)?;

        info!("Local store opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .lock()?
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.execute(
            r"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove the value stored under `key`.
    ///
    /// Returns `true` if a value was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let affected = self
            .lock()?
            .execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(affected > 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("local store connection lock poisoned"))
    }

    fn read_entries(&self) -> Result<Vec<Entry>> {
        match self.get_item(ENTRIES_KEY)? {
            Some(payload) => document::from_document(&payload),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStore {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn load_entries(&self) -> Result<Vec<Entry>> {
        let entries = self
            .read_entries()
            .map_err(|e| Error::load_failure(BACKEND_NAME, e.to_string()))?;
        debug!(count = entries.len(), "Loaded entries from local store");
        Ok(entries)
    }

    async fn save_entries(&self, entries: &[Entry]) -> Result<()> {
        let payload = document::to_document(entries)
            .map_err(|e| Error::save_failure(BACKEND_NAME, e.to_string()))?;
        self.set_item(ENTRIES_KEY, &payload)
            .map_err(|e| Error::save_failure(BACKEND_NAME, e.to_string()))?;
        debug!(count = entries.len(), "Saved entries to local store");
        Ok(())
    }

    async fn export_data(&self, dest: &Path) -> Result<ExportReceipt> {
        let entries = self
            .read_entries()
            .map_err(|e| Error::export_failure(dest, e.to_string()))?;
        document::write_document(dest, &entries)
            .await
            .map_err(|e| Error::export_failure(dest, e.to_string()))?;
        Ok(ExportReceipt {
            path: dest.to_path_buf(),
            count: entries.len(),
        })
    }

    async fn import_data(&self, source: &Path) -> Result<Vec<Entry>> {
        document::read_document(source)
            .await
            .map_err(|e| Error::import_failure(source, e.to_string()))
    }
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryId;

    fn sample(id: &str, name: &str) -> Entry {
        Entry {
            id: EntryId::new(id),
            full_name: name.to_string(),
            identifier: "111".to_string(),
            role: "Visitor".to_string(),
            organization: "ACME".to_string(),
            municipality: String::new(),
            phone: String::new(),
            entry_timestamp: "01/05/2024, 10:00:00".to_string(),
            photo: None,
        }
    }

    #[test]
    fn test_item_round_trip() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);

        store.set_item("k", "one").unwrap();
        store.set_item("k", "two").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("two"));

        assert!(store.remove_item("k").unwrap());
        assert!(!store.remove_item("k").unwrap());
    }

    #[tokio::test]
    async fn test_load_empty_store() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(store.load_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = LocalStore::open_in_memory().unwrap();
        let entries = vec![sample("2", "Bruno"), sample("1", "Ana")];
        store.save_entries(&entries).await.unwrap();
        assert_eq!(store.load_entries().await.unwrap(), entries);

        let payload = store.get_item(ENTRIES_KEY).unwrap().unwrap();
        assert!(payload.starts_with('['));
        assert!(payload.contains("\n  {"));
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_load_failure() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_item(ENTRIES_KEY, "{not json").unwrap();
        let err = store.load_entries().await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_export_and_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_in_memory().unwrap();
        let entries = vec![sample("1", "Ana")];
        store.save_entries(&entries).await.unwrap();

        let dest = dir.path().join("backup-entries.json");
        let receipt = store.export_data(&dest).await.unwrap();
        assert_eq!(receipt.path, dest);
        assert_eq!(receipt.count, 1);

        let imported = store.import_data(&dest).await.unwrap();
        assert_eq!(imported, entries);
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let store = LocalStore::open_in_memory().unwrap();
        let err = store
            .import_data(Path::new("/nonexistent/backup.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ImportFailure { .. }));
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/visitlog.db");

        let store = LocalStore::open(&db_path).unwrap();
        store.set_item("k", "v").unwrap();
        assert!(db_path.exists());
        assert_eq!(store.path(), db_path);
    }

    #[test]
    fn test_path_in_memory() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.path().to_string_lossy(), ":memory:");
        assert_eq!(store.name(), "local");
    }
}
