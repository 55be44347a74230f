//! Summary figures for the entry log.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::parse_calendar_date;
use crate::entry::Entry;

/// The most recent entry, as shown in the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestEntry {
    /// First word of the visitor's name.
    pub first_name: String,
    /// The entry's timestamp.
    pub entry_timestamp: String,
}

/// Totals over the whole collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryStats {
    /// Number of entries.
    pub total: usize,
    /// Entries whose date is `today`.
    pub today: usize,
    /// The first entry in store order.
    pub latest: Option<LatestEntry>,
}

impl EntryStats {
    /// Compute the summary for newest-first `entries`.
    #[must_use]
    pub fn compute(entries: &[Entry], today: NaiveDate) -> Self {
        let today_count = entries
            .iter()
            .filter(|e| parse_calendar_date(e.entry_date_text()) == Some(today))
            .count();

        Self {
            total: entries.len(),
            today: today_count,
            latest: entries.first().map(|e| LatestEntry {
                first_name: e.first_name().to_string(),
                entry_timestamp: e.entry_timestamp.clone(),
            }),
        }
    }
}
