//! Fixed-width tabular report.
//!
//! One row per entry, in the order given. Each page repeats the title,
//! period and column header, and ends with a footer carrying the record
//! count, the page number and the generation time. Pages are separated by
//! a form feed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::info;

use super::document::write_atomically;
use crate::dates::format_display_date;
use crate::entry::{format_timestamp, Entry};
use crate::error::{Error, Result};
use crate::filter::{Bound, DateRange};

/// Report title printed at the top of every page.
pub const REPORT_TITLE: &str = "ENTRY REPORT";

/// Placeholder for empty cells.
pub const EMPTY_CELL: &str = "N/A";

/// Default number of rows per page.
pub const DEFAULT_ROWS_PER_PAGE: usize = 24;

const PAGE_BREAK: char = '\u{c}';
const COLUMN_GAP: &str = "  ";

/// One report column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Header text.
    pub title: &'static str,
    /// Maximum cell width in characters.
    pub width: usize,
    value: fn(&Entry) -> &str,
}

impl Column {
    /// The cell text for `entry`, truncated to the column width.
    #[must_use]
    pub fn cell(&self, entry: &Entry) -> String {
        let raw = (self.value)(entry).trim();
        let text = if raw.is_empty() { EMPTY_CELL } else { raw };
        text.chars().take(self.width).collect()
    }
}

/// Columns of the report, left to right.
pub const COLUMNS: [Column; 6] = [
    Column {
        title: "Name",
        width: 28,
        value: full_name,
    },
    Column {
        title: "Identifier",
        width: 14,
        value: identifier,
    },
    Column {
        title: "Role",
        width: 18,
        value: role,
    },
    Column {
        title: "Phone",
        width: 15,
        value: phone,
    },
    Column {
        title: "Organization",
        width: 25,
        value: organization,
    },
    Column {
        title: "Date/Time",
        width: 20,
        value: entry_timestamp,
    },
];

fn full_name(e: &Entry) -> &str {
    &e.full_name
}

fn identifier(e: &Entry) -> &str {
    &e.identifier
}

fn role(e: &Entry) -> &str {
    &e.role
}

fn phone(e: &Entry) -> &str {
    &e.phone
}

fn organization(e: &Entry) -> &str {
    &e.organization
}

fn entry_timestamp(e: &Entry) -> &str {
    &e.entry_timestamp
}

/// Page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    /// Entry rows that fit on one page.
    pub rows_per_page: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

/// A report ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    period: Option<String>,
    rows: Vec<String>,
    rows_per_page: usize,
    generated_at: String,
}

impl Report {
    /// Lay out `entries`, keeping their order.
    #[must_use]
    pub fn build(
        entries: &[&Entry],
        range: &DateRange,
        layout: ReportLayout,
        generated_at: &DateTime<Local>,
    ) -> Self {
        Self {
            period: period_line(range),
            rows: entries.iter().map(|entry| format_row(entry)).collect(),
            rows_per_page: layout.rows_per_page.max(1),
            generated_at: format_timestamp(generated_at),
        }
    }

    /// Number of entry rows.
    #[must_use]
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Number of pages; an empty report still has one.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.rows_per_page).max(1)
    }

    /// Render every page as fixed-width text.
    #[must_use]
    pub fn render(&self) -> String {
        let pages = self.page_count();
        let mut out = String::new();
        for page in 0..pages {
            if page > 0 {
                out.push(PAGE_BREAK);
            }
            let start = page * self.rows_per_page;
            let end = (start + self.rows_per_page).min(self.rows.len());
            self.render_page(&mut out, page + 1, pages, &self.rows[start..end]);
        }
        out
    }

    fn render_page(&self, out: &mut String, number: usize, pages: usize, rows: &[String]) {
        let header = format_header();
        push_line(out, REPORT_TITLE);
        if let Some(period) = &self.period {
            push_line(out, period);
        }
        push_line(out, "");
        push_line(out, &header);
        push_line(out, &"-".repeat(header.chars().count()));
        for row in rows {
            push_line(out, row);
        }
        push_line(out, "");

        let total = format!("Total records: {}", self.rows.len());
        let page = format!("Page {number} of {pages}");
        let width = header.chars().count().saturating_sub(page.len());
        push_line(out, &format!("{total:<width$}{page}"));
        push_line(out, &format!("Generated at: {}", self.generated_at));
    }
}

/// File name for a report generated on `date`.
#[must_use]
pub fn report_file_name(date: NaiveDate) -> String {
    format!("entry-report-{}.txt", date.format("%Y-%m-%d"))
}

/// Render `report` into `dir`, named after `date`.
///
/// # Errors
///
/// Returns [`Error::ExportFailure`] if the file cannot be written; no
/// partial file is left behind.
pub async fn write_report(report: &Report, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let path = dir.join(report_file_name(date));
    write_atomically(&path, report.render().as_bytes())
        .await
        .map_err(|e| Error::export_failure(&path, e.to_string()))?;
    info!(
        path = %path.display(),
        records = report.total(),
        pages = report.page_count(),
        "Report written"
    );
    Ok(path)
}

fn period_line(range: &DateRange) -> Option<String> {
    if !range.is_active() {
        return None;
    }
    let side = |bound: Bound, open: &str| match bound {
        Bound::Date(date) => format_display_date(date),
        Bound::Open | Bound::Invalid => open.to_string(),
    };
    Some(format!(
        "Period: {} to {}",
        side(range.start, "Start"),
        side(range.end, "Today")
    ))
}

/// The column titles, padded to the column widths.
#[must_use]
pub fn format_header() -> String {
    join_cells(COLUMNS.iter().map(|c| (c.title.to_string(), c.width)))
}

/// One entry as a line of cells aligned under [`format_header`].
#[must_use]
pub fn format_row(entry: &Entry) -> String {
    join_cells(COLUMNS.iter().map(|c| (c.cell(entry), c.width)))
}

fn join_cells(cells: impl Iterator<Item = (String, usize)>) -> String {
    let line = cells
        .map(|(text, width)| format!("{text:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
