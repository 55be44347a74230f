//! File-backed storage behind a host request/response bridge.
//!
//! The host owns the data file and answers [`HostRequest`]s on its own task.
//! [`BridgeBackend`] is the client side: each call sends one request and
//! awaits one [`HostResponse`]. The host task exits once every client
//! handle has been dropped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{ExportReceipt, StorageBackend};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::export::document;

/// Default name of the host's data file.
pub const DATA_FILE_NAME: &str = "entries.json";

const BACKEND_NAME: &str = "file";

/// Pending requests the host will queue before callers wait.
const REQUEST_QUEUE_DEPTH: usize = 16;

/// A request sent to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Read the persisted entries.
    LoadEntries,
    /// Replace the persisted entries.
    SaveEntries(Vec<Entry>),
    /// Copy the persisted entries to `dest`.
    ExportData {
        /// Destination file.
        dest: PathBuf,
    },
    /// Read entries from `source` without persisting them.
    ImportData {
        /// File to read.
        source: PathBuf,
    },
}

impl HostRequest {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadEntries => "load-entries",
            Self::SaveEntries(_) => "save-entries",
            Self::ExportData { .. } => "export-data",
            Self::ImportData { .. } => "import-data",
        }
    }
}

/// The host's answer to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostResponse {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Written file, for exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Number of entries written, for exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Entries, for loads and imports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Entry>>,
    /// Failure description when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostResponse {
    fn ack() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn records(records: Vec<Entry>) -> Self {
        Self {
            ok: true,
            records: Some(records),
            ..Self::default()
        }
    }

    fn written(path: PathBuf, count: usize) -> Self {
        Self {
            ok: true,
            path: Some(path),
            count: Some(count),
            ..Self::default()
        }
    }

    fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct Envelope {
    request: HostRequest,
    reply: oneshot::Sender<HostResponse>,
}

/// Host side of the bridge: performs file I/O on the data file.
#[derive(Debug, Clone)]
pub struct FileHost {
    data_file: PathBuf,
}

impl FileHost {
    /// Create a host for the given data file.
    #[must_use]
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    /// Answer a single request.
    pub async fn handle(&self, request: HostRequest) -> HostResponse {
        match request {
            HostRequest::LoadEntries => match self.load().await {
                Ok(records) => HostResponse::records(records),
                Err(e) => HostResponse::failed(e),
            },
            HostRequest::SaveEntries(entries) => {
                match document::write_document(&self.data_file, &entries).await {
                    Ok(()) => HostResponse::ack(),
                    Err(e) => HostResponse::failed(e),
                }
            }
            HostRequest::ExportData { dest } => match self.export(&dest).await {
                Ok(count) => HostResponse::written(dest, count),
                Err(e) => HostResponse::failed(e),
            },
            HostRequest::ImportData { source } => match document::read_document(&source).await {
                Ok(records) => HostResponse::records(records),
                Err(e) => HostResponse::failed(e),
            },
        }
    }

    async fn load(&self) -> Result<Vec<Entry>> {
        if !tokio::fs::try_exists(&self.data_file).await? {
            return Ok(Vec::new());
        }
        document::read_document(&self.data_file).await
    }

    async fn export(&self, dest: &Path) -> Result<usize> {
        let records = self.load().await?;
        document::write_document(dest, &records).await?;
        Ok(records.len())
    }

    async fn serve(self, mut requests: mpsc::Receiver<Envelope>) {
        debug!(data_file = %self.data_file.display(), "File host started");
        while let Some(Envelope { request, reply }) = requests.recv().await {
            let kind = request.kind();
            let response = self.handle(request).await;
            if !response.ok {
                warn!(request = kind, error = ?response.error, "Host request failed");
            }
            if reply.send(response).is_err() {
                debug!(request = kind, "Caller went away before the reply");
            }
        }
        debug!("File host stopped");
    }
}

/// Client side of the bridge.
#[derive(Debug, Clone)]
pub struct BridgeBackend {
    requests: mpsc::Sender<Envelope>,
}

impl BridgeBackend {
    /// Spawn a [`FileHost`] for `data_file` on the current runtime and
    /// return a client connected to it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(data_file: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        tokio::spawn(FileHost::new(data_file).serve(rx));
        Self { requests: tx }
    }

    async fn call(&self, request: HostRequest) -> Result<HostResponse> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Envelope { request, reply })
            .await
            .map_err(|_| Error::bridge("host is not running"))?;
        response
            .await
            .map_err(|_| Error::bridge("host dropped the request"))
    }
}

#[async_trait]
impl StorageBackend for BridgeBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn load_entries(&self) -> Result<Vec<Entry>> {
        let response = self
            .call(HostRequest::LoadEntries)
            .await
            .map_err(|e| Error::load_failure(BACKEND_NAME, e.to_string()))?;
        match response {
            HostResponse {
                ok: true,
                records: Some(records),
                ..
            } => Ok(records),
            other => Err(Error::load_failure(BACKEND_NAME, describe(&other))),
        }
    }

    async fn save_entries(&self, entries: &[Entry]) -> Result<()> {
        let response = self
            .call(HostRequest::SaveEntries(entries.to_vec()))
            .await
            .map_err(|e| Error::save_failure(BACKEND_NAME, e.to_string()))?;
        if response.ok {
            Ok(())
        } else {
            Err(Error::save_failure(BACKEND_NAME, describe(&response)))
        }
    }

    async fn export_data(&self, dest: &Path) -> Result<ExportReceipt> {
        let response = self
            .call(HostRequest::ExportData {
                dest: dest.to_path_buf(),
            })
            .await
            .map_err(|e| Error::export_failure(dest, e.to_string()))?;
        match response {
            HostResponse {
                ok: true,
                path: Some(path),
                count: Some(count),
                ..
            } => Ok(ExportReceipt { path, count }),
            other => Err(Error::export_failure(dest, describe(&other))),
        }
    }

    async fn import_data(&self, source: &Path) -> Result<Vec<Entry>> {
        let response = self
            .call(HostRequest::ImportData {
                source: source.to_path_buf(),
            })
            .await
            .map_err(|e| Error::import_failure(source, e.to_string()))?;
        match response {
            HostResponse {
                ok: true,
                records: Some(records),
                ..
            } => Ok(records),
            other => Err(Error::import_failure(source, describe(&other))),
        }
    }
}

fn describe(response: &HostResponse) -> String {
    response
        .error
        .clone()
        .unwrap_or_else(|| "host returned an incomplete response".to_string())
}
