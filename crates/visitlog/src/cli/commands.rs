//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::BackendKind;
use crate::entry::NewEntry;

/// Arguments for recording a new entry.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Full name of the visitor
    #[arg(short, long)]
    pub name: Option<String>,

    /// National ID (CPF)
    #[arg(short, long)]
    pub identifier: Option<String>,

    /// Role or job title
    #[arg(short, long)]
    pub role: Option<String>,

    /// Organization the visitor represents
    #[arg(short, long)]
    pub organization: Option<String>,

    /// Municipality
    #[arg(short, long)]
    pub municipality: Option<String>,

    /// Phone number
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Image file to attach as the visitor's photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Fill missing fields from the latest entry with the same identifier
    #[arg(short, long)]
    pub autofill: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

impl AddCommand {
    /// The submission described by the flags, without the photo.
    #[must_use]
    pub fn to_new_entry(&self) -> NewEntry {
        let field = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        NewEntry {
            full_name: field(&self.name),
            identifier: field(&self.identifier),
            role: field(&self.role),
            organization: field(&self.organization),
            municipality: field(&self.municipality),
            phone: field(&self.phone),
            photo: None,
        }
    }
}

/// Search and date-range arguments shared by `list` and `report`.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Search term (name, identifier, role, organization, municipality)
    pub term: Option<String>,

    /// Only entries on or after this date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub from: Option<String>,

    /// Only entries on or before this date (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub to: Option<String>,
}

impl FilterArgs {
    /// The search term, empty when not given.
    #[must_use]
    pub fn term(&self) -> &str {
        self.term.as_deref().unwrap_or_default()
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Entry id
    pub id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Entry id
    pub id: String,
}

/// Lookup command arguments.
#[derive(Debug, Args)]
pub struct LookupCommand {
    /// Identifier to look up
    pub identifier: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Directory to write the report to (overrides `report.output_dir`)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file (defaults to `backup-entries.json`)
    #[arg(value_name = "FILE")]
    pub path: Option<PathBuf>,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Backup file to import; replaces every stored entry
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Storage backend argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Local key-value store
    Local,
    /// Host-managed data file
    File,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => Self::Local,
            BackendArg::File => Self::File,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
