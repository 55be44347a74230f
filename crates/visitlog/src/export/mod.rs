//! Export adapters.
//!
//! - [`report`]: a paginated fixed-width report of a (possibly filtered)
//!   set of entries.
//! - [`document`]: the portable JSON document of the full set, used for
//!   backup and restore.

pub mod document;
pub mod report;

pub use document::{from_document, to_document, BACKUP_FILE_NAME};
pub use report::{format_header, format_row, write_report, Report, ReportLayout};
