//! Configuration management for visitlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::entry::EntrySchema;
use crate::error::{Error, Result};
use crate::export::ReportLayout;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "visitlog";

/// Default local store database file name.
const DATABASE_FILE_NAME: &str = "visitlog.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `VISITLOG_`, sections joined by `__`)
/// 2. TOML config file at `~/.config/visitlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Entry schema configuration.
    pub entry: EntryConfig,
    /// Report configuration.
    pub report: ReportConfig,
}

/// Which persistence mechanism backs the record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Key-value store in a local `SQLite` file.
    Local,
    /// JSON data file owned by the host bridge.
    #[default]
    File,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Active backend.
    pub backend: BackendKind,
    /// Path to the local store database.
    /// Defaults to `~/.local/share/visitlog/visitlog.db`
    pub database_path: Option<PathBuf>,
    /// Path to the host bridge data file.
    /// Defaults to `~/.local/share/visitlog/entries.json`
    pub data_file: Option<PathBuf>,
}

/// Entry schema configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Reject submissions and imports without an identifier.
    pub identifier_required: bool,
}

/// Report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Entry rows per report page.
    pub rows_per_page: usize,
    /// Directory reports are written to.
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            identifier_required: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            rows_per_page: ReportLayout::default().rows_per_page,
            output_dir: None,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("VISITLOG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.report.rows_per_page == 0 {
            return Err(Error::ConfigValidation {
                message: "rows_per_page must be greater than 0".to_string(),
            });
        }

        if let (Some(db), Some(data)) = (&self.storage.database_path, &self.storage.data_file) {
            if db == data {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "database_path and data_file must differ (both are {})",
                        db.display()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the local store path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the host data file path, resolving defaults if not set.
    #[must_use]
    pub fn data_file_path(&self) -> PathBuf {
        self.storage.data_file.clone().unwrap_or_else(|| {
            Self::default_data_dir().join(crate::storage::bridge::DATA_FILE_NAME)
        })
    }

    /// Get the report directory, resolving defaults if not set.
    #[must_use]
    pub fn report_dir(&self) -> PathBuf {
        self.report
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The entry schema implied by this configuration.
    #[must_use]
    pub fn entry_schema(&self) -> EntrySchema {
        EntrySchema::with_identifier_required(self.entry.identifier_required)
    }

    /// The report layout implied by this configuration.
    #[must_use]
    pub fn report_layout(&self) -> ReportLayout {
        ReportLayout {
            rows_per_page: self.report.rows_per_page,
        }
    }
}
