//! Command-line interface for visitlog.
//!
//! This module provides the CLI structure for the `visitlog` binary. The
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, BackendArg, ConfigCommand, DeleteCommand, ExportCommand, FilterArgs,
    ImportCommand, ListCommand, LookupCommand, OutputFormat, ReportCommand, ShowCommand,
    StatsCommand,
};

/// visitlog - Record, search and export visitor entries
///
/// Every visit is stored with the visitor's identification data and an
/// optional photo. Entries can be filtered by text and date, exported to a
/// paginated report, and backed up to a portable JSON file.
#[derive(Debug, Parser)]
#[command(name = "visitlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors (command output is still printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Storage backend (overrides `storage.backend`)
    #[arg(short, long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new entry
    Add(AddCommand),

    /// List entries, optionally filtered
    List(ListCommand),

    /// Show one entry in full
    Show(ShowCommand),

    /// Delete an entry
    Delete(DeleteCommand),

    /// Show the prefill for an identifier
    Lookup(LookupCommand),

    /// Show entry totals
    Stats(StatsCommand),

    /// Write a paginated report of (filtered) entries
    Report(ReportCommand),

    /// Export every entry to a JSON backup
    Export(ExportCommand),

    /// Replace every entry with a JSON backup
    Import(ImportCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
