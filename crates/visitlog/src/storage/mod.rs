//! Storage backends for visitlog.
//!
//! The record store persists through [`StorageBackend`] and never knows
//! which implementation is active:
//!
//! - [`LocalStore`]: a synchronous key-value store in a `SQLite` file.
//! - [`BridgeBackend`]: a file-backed store reached through an async
//!   request/response bridge to a host task.

pub mod bridge;
pub mod local;
pub mod schema;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::entry::Entry;
use crate::error::Result;

pub use bridge::{BridgeBackend, FileHost, HostRequest, HostResponse};
pub use local::LocalStore;

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    /// File that was written.
    pub path: PathBuf,
    /// Number of entries written.
    pub count: usize,
}

/// A persistence mechanism for the entry collection.
///
/// Every method writes or reads the whole collection; there are no
/// partial updates.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Short name of this backend (for logging and error messages).
    fn name(&self) -> &'static str;

    /// Read the persisted entries; an empty collection if none exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LoadFailure`] if the backend is unreachable
    /// or the payload cannot be parsed.
    async fn load_entries(&self) -> Result<Vec<Entry>>;

    /// Replace the persisted entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SaveFailure`] if the write fails.
    async fn save_entries(&self, entries: &[Entry]) -> Result<()>;

    /// Write the persisted entries to `dest` as a portable document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExportFailure`] if the document cannot be
    /// written.
    async fn export_data(&self, dest: &Path) -> Result<ExportReceipt>;

    /// Read a portable document from `source`. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ImportFailure`] if the file is missing or
    /// invalid.
    async fn import_data(&self, source: &Path) -> Result<Vec<Entry>>;
}

/// Open the backend selected by the configuration.
///
/// The file backend spawns its host task, so this must run inside a Tokio
/// runtime.
///
/// # Errors
///
/// Returns an error if the local store database cannot be opened.
pub fn open_backend(config: &Config) -> Result<Box<dyn StorageBackend>> {
    let backend: Box<dyn StorageBackend> = match config.storage.backend {
        BackendKind::Local => Box::new(LocalStore::open(config.database_path())?),
        BackendKind::File => Box::new(BridgeBackend::spawn(config.data_file_path())),
    };
    info!(backend = backend.name(), "Storage backend ready");
    Ok(backend)
}
