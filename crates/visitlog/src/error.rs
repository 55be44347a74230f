//! Error types for visitlog.
//!
//! Every failure is recovered at the boundary where it occurs: load failures
//! fall back to an empty store, the rest are surfaced to the operator as a
//! notice while in-memory state stays intact.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for visitlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Persistence Errors ===
    /// The backend could not produce the persisted entries.
    #[error("failed to load entries from {backend}: {message}")]
    LoadFailure {
        /// Name of the backend that failed.
        backend: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The backend could not persist the entries.
    #[error("failed to save entries to {backend}: {message}")]
    SaveFailure {
        /// Name of the backend that failed.
        backend: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The selected import file was missing or invalid.
    #[error("failed to import entries from {path}: {message}")]
    ImportFailure {
        /// File that was being imported.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// Report or document generation failed.
    #[error("failed to export to {path}: {message}")]
    ExportFailure {
        /// Destination that was being written.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Entry Errors ===
    /// Required fields were missing at submission.
    #[error("missing required fields: {}", missing.join(", "))]
    Validation {
        /// Names of the missing fields.
        missing: Vec<&'static str>,
    },

    /// A date range bound could not be parsed.
    #[error("invalid date '{value}': expected YYYY-MM-DD or DD/MM/YYYY")]
    InvalidDateBound {
        /// The rejected input.
        value: String,
    },

    /// No entry carries the given id.
    #[error("no entry with id {0}")]
    EntryNotFound(String),

    // === Storage Errors ===
    /// Failed to open or create the local store database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// The host bridge stopped answering requests.
    #[error("host bridge error: {0}")]
    Bridge(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for visitlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a load failure for the named backend.
    #[must_use]
    pub fn load_failure(backend: &'static str, message: impl Into<String>) -> Self {
        Self::LoadFailure {
            backend,
            message: message.into(),
        }
    }

    /// Create a save failure for the named backend.
    #[must_use]
    pub fn save_failure(backend: &'static str, message: impl Into<String>) -> Self {
        Self::SaveFailure {
            backend,
            message: message.into(),
        }
    }

    /// Create an import failure for the given file.
    #[must_use]
    pub fn import_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ImportFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an export failure for the given destination.
    #[must_use]
    pub fn export_failure(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExportFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new host bridge error.
    #[must_use]
    pub fn bridge(message: impl Into<String>) -> Self {
        Self::Bridge(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a submission validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::InvalidDateBound { .. })
    }

    /// Check if the application can keep running with an empty store.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::LoadFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_fields() {
        let err = Error::Validation {
            missing: vec!["name", "role"],
        };
        assert_eq!(err.to_string(), "missing required fields: name, role");
        assert!(err.is_validation());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_load_failure_is_recoverable() {
        let err = Error::load_failure("local", "payload is not JSON");
        assert!(err.is_recoverable());
        let msg = err.to_string();
        assert!(msg.contains("local"));
        assert!(msg.contains("payload is not JSON"));
    }

    #[test]
    fn test_save_failure_display() {
        let err = Error::save_failure("file", "disk full");
        assert_eq!(err.to_string(), "failed to save entries to file: disk full");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_import_failure_display() {
        let err = Error::import_failure("/tmp/backup.json", "expected an array");
        let msg = err.to_string();
        assert!(msg.contains("/tmp/backup.json"));
        assert!(msg.contains("expected an array"));
    }

    #[test]
    fn test_export_failure_display() {
        let err = Error::export_failure("/readonly/report.txt", "permission denied");
        assert!(err.to_string().contains("/readonly/report.txt"));
    }

    #[test]
    fn test_invalid_date_bound_is_validation() {
        let err = Error::InvalidDateBound {
            value: "tomorrow".to_string(),
        };
        assert!(err.is_validation());
        assert!(err.to_string().contains("tomorrow"));
    }

    #[test]
    fn test_entry_not_found_display() {
        let err = Error::EntryNotFound("1714557600000".to_string());
        assert_eq!(err.to_string(), "no entry with id 1714557600000");
    }

    #[test]
    fn test_bridge_and_internal_errors() {
        assert_eq!(
            Error::bridge("host stopped").to_string(),
            "host bridge error: host stopped"
        );
        assert_eq!(
            Error::internal("something went wrong").to_string(),
            "internal error: something went wrong"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/visitlog.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/visitlog.db"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/visitlog.db"));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "rows_per_page must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("rows_per_page"));
    }
}
