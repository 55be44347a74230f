//! Portable JSON document.
//!
//! A pretty-printed JSON array of entries. This one shape serves as the
//! local store payload, the host data file and the backup file, so any of
//! them can be fed back into [`crate::store::RecordStore::replace_all`].

use std::path::{Path, PathBuf};

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Default file name for a backup export.
pub const BACKUP_FILE_NAME: &str = "backup-entries.json";

/// Serialize entries as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_document(entries: &[Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Parse a JSON array of entries.
///
/// # Errors
///
/// Returns an error if `text` is not a JSON array of entries.
pub fn from_document(text: &str) -> Result<Vec<Entry>> {
    Ok(serde_json::from_str(text)?)
}

/// Write entries to `path` as a document.
///
/// # Errors
///
/// Returns an error if serialization or any file operation fails. No
/// partially written file is left at `path`.
pub async fn write_document(path: &Path, entries: &[Entry]) -> Result<()> {
    let text = to_document(entries)?;
    write_atomically(path, text.as_bytes()).await
}

/// Read a document from `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a document.
pub async fn read_document(path: &Path) -> Result<Vec<Entry>> {
    let text = tokio::fs::read_to_string(path).await?;
    from_document(&text)
}

/// Write `contents` to a temporary sibling of `path`, then rename it into
/// place. Parent directories are created as needed.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }

    let staging = staging_path(path);
    if let Err(e) = tokio::fs::write(&staging, contents).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
