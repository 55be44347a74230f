//! Entry filtering by search term and date range.
//!
//! Filtering never reorders: the result keeps the store's newest-first
//! order so it can be displayed or exported directly.

use chrono::NaiveDate;
use tracing::trace;

use crate::dates::parse_calendar_date;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// One side of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// No constraint on this side.
    Open,
    /// Inclusive calendar date.
    Date(NaiveDate),
    /// A bound was given but could not be parsed.
    Invalid,
}

impl Bound {
    /// Parse an optional bound; empty input means [`Bound::Open`].
    #[must_use]
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None | Some("") => Self::Open,
            Some(text) => parse_calendar_date(text).map_or(Self::Invalid, Self::Date),
        }
    }

    fn is_active(self) -> bool {
        !matches!(self, Self::Open)
    }

    fn date(self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(date),
            Self::Open | Self::Invalid => None,
        }
    }
}

/// Inclusive date range over entry dates.
///
/// Entry dates carry no time, so an end bound covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest date included.
    pub start: Bound,
    /// Latest date included.
    pub end: Bound,
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DateRange {
    /// A range that admits every entry.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            start: Bound::Open,
            end: Bound::Open,
        }
    }

    /// A range between two known dates.
    #[must_use]
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Bound::Date(start),
            end: Bound::Date(end),
        }
    }

    /// Build a range from raw inputs, keeping unparseable bounds as
    /// [`Bound::Invalid`].
    #[must_use]
    pub fn from_inputs(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: Bound::parse(start),
            end: Bound::parse(end),
        }
    }

    /// Build a range from raw inputs, rejecting unparseable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDateBound`] for the first bound that fails.
    pub fn try_from_inputs(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let range = Self::from_inputs(start, end);
        for (bound, raw) in [(range.start, start), (range.end, end)] {
            if bound == Bound::Invalid {
                return Err(Error::InvalidDateBound {
                    value: raw.unwrap_or_default().to_string(),
                });
            }
        }
        Ok(range)
    }

    /// Whether any bound constrains the range.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.start.is_active() || self.end.is_active()
    }

    /// Check an entry timestamp against the range.
    ///
    /// With an active range, an unparseable timestamp or an invalid bound
    /// never matches.
    #[must_use]
    pub fn contains_timestamp(&self, timestamp: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        if self.start == Bound::Invalid || self.end == Bound::Invalid {
            return false;
        }
        let Some(date) = parse_calendar_date(timestamp) else {
            return false;
        };
        self.start.date().map_or(true, |start| date >= start)
            && self.end.date().map_or(true, |end| date <= end)
    }
}

/// A search term plus a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    /// Case-insensitive substring; empty matches everything.
    pub term: String,
    /// Date constraint on the entry timestamp.
    pub range: DateRange,
}

impl EntryQuery {
    /// Create a query from a term and a range.
    #[must_use]
    pub fn new(term: impl Into<String>, range: DateRange) -> Self {
        Self {
            term: term.into(),
            range,
        }
    }

    /// Whether the query constrains anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.term.is_empty() && !self.range.is_active()
    }

    /// Check a single entry against both criteria.
    #[must_use]
    pub fn matches(&self, entry: &Entry) -> bool {
        self.matches_with(entry, &self.term.to_lowercase())
    }

    /// Apply the query to a collection, keeping its order.
    #[must_use]
    pub fn apply<'a>(&self, entries: &'a [Entry]) -> Vec<&'a Entry> {
        let needle = self.term.to_lowercase();
        let matched: Vec<&Entry> = entries
            .iter()
            .filter(|entry| self.matches_with(entry, &needle))
            .collect();
        trace!(
            term = %self.term,
            total = entries.len(),
            matched = matched.len(),
            "Filtered entries"
        );
        matched
    }

    /// `needle` is the lowercased term.
    fn matches_with(&self, entry: &Entry, needle: &str) -> bool {
        matches_term(entry, needle) && self.range.contains_timestamp(&entry.entry_timestamp)
    }
}

/// Filter entries by term and optional raw date bounds.
///
/// Bounds are parsed with [`parse_calendar_date`]; see
/// [`DateRange::contains_timestamp`] for how failures are treated.
#[must_use]
pub fn filter_entries<'a>(
    entries: &'a [Entry],
    term: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Vec<&'a Entry> {
    EntryQuery::new(term, DateRange::from_inputs(start, end)).apply(entries)
}

fn matches_term(entry: &Entry, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [
        &entry.full_name,
        &entry.identifier,
        &entry.role,
        &entry.organization,
        &entry.municipality,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}
