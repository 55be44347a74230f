//! Calendar date normalization.
//!
//! Entry timestamps are stored in display form (`01/05/2024, 10:00:00`)
//! while range bounds usually arrive in ISO form (`2024-05-01`). Both are
//! reduced to a [`NaiveDate`] here so comparisons happen in one place.

use chrono::NaiveDate;

/// Parse a day/month/year or year-month-day string into a calendar date.
///
/// The day/month/year form may be followed by a comma and a time, which is
/// ignored. Returns `None` for anything else, including impossible dates.
///
/// ```
/// use chrono::NaiveDate;
/// use visitlog::dates::parse_calendar_date;
///
/// assert_eq!(
///     parse_calendar_date("01/05/2024, 10:00:00"),
///     NaiveDate::from_ymd_opt(2024, 5, 1)
/// );
/// assert_eq!(
///     parse_calendar_date("2024-05-01"),
///     NaiveDate::from_ymd_opt(2024, 5, 1)
/// );
/// assert_eq!(parse_calendar_date("yesterday"), None);
/// ```
#[must_use]
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let date_part = input.split(',').next().unwrap_or_default().trim();
    if let Some([day, month, year]) = numeric_parts(date_part, '/') {
        return to_date(year, month, day);
    }

    let [year, month, day] = numeric_parts(input, '-')?;
    to_date(year, month, day)
}

/// Render a date the way entry timestamps show it.
#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn numeric_parts(text: &str, separator: char) -> Option<[i64; 3]> {
    let mut parts = text.split(separator);
    let first = parse_number(parts.next()?)?;
    let second = parse_number(parts.next()?)?;
    let third = parse_number(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some([first, second, third])
}

fn parse_number(part: &str) -> Option<i64> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn to_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}
