//! `visitlog` - A visitor entry log
//!
//! This library holds the entry model, the record store and its storage
//! backends, text and date-range filtering, identifier autofill, and the
//! report and backup exporters used by the `visitlog` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod autofill;
pub mod cli;
pub mod config;
pub mod dates;
pub mod entry;
pub mod error;
pub mod export;
pub mod filter;
pub mod logging;
pub mod photo;
pub mod stats;
pub mod storage;
pub mod store;

pub use autofill::Prefill;
pub use config::{BackendKind, Config};
pub use dates::parse_calendar_date;
pub use entry::{Entry, EntryId, EntrySchema, NewEntry};
pub use error::{Error, Result};
pub use filter::{filter_entries, DateRange, EntryQuery};
pub use logging::init_logging;
pub use photo::encode_photo;
pub use stats::EntryStats;
pub use storage::{open_backend, ExportReceipt, StorageBackend};
pub use store::{LoadOutcome, RecordStore};
