//! Prefill for returning visitors.
//!
//! When an identifier that is already in the log is entered again, the most
//! recent entry with that identifier supplies the form fields. The photo is
//! never carried over and must be captured again.

use serde::Serialize;

use crate::entry::{Entry, NewEntry};

/// Tie-break rule for duplicate identifiers: pick the most recent visit.
///
/// `matches` must be in store order. The store is newest-first, so the most
/// recent visit is the first one yielded.
pub fn most_recent_first<'a>(mut matches: impl Iterator<Item = &'a Entry>) -> Option<&'a Entry> {
    matches.next()
}

/// Find the most recent entry whose identifier equals `identifier` exactly.
///
/// No formatting normalization happens: `123.456.789-00` and `12345678900`
/// are different identifiers. An empty identifier never matches.
#[must_use]
pub fn find_by_identifier<'a>(entries: &'a [Entry], identifier: &str) -> Option<&'a Entry> {
    if identifier.is_empty() {
        return None;
    }
    most_recent_first(
        entries
            .iter()
            .filter(|entry| entry.identifier == identifier),
    )
}

/// Form fields copied from a previous entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prefill {
    /// Full name of the visitor.
    pub full_name: String,
    /// National ID (CPF) of the visitor.
    pub identifier: String,
    /// Role or job title.
    pub role: String,
    /// Organization the visitor represents.
    pub organization: String,
    /// Municipality.
    pub municipality: String,
    /// Phone number.
    pub phone: String,
}

impl Prefill {
    /// Copy every prefillable field verbatim.
    #[must_use]
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            full_name: entry.full_name.clone(),
            identifier: entry.identifier.clone(),
            role: entry.role.clone(),
            organization: entry.organization.clone(),
            municipality: entry.municipality.clone(),
            phone: entry.phone.clone(),
        }
    }

    /// Fill the empty fields of a submission; fields already typed win.
    ///
    /// The photo is left as it is.
    #[must_use]
    pub fn apply_to(&self, mut new: NewEntry) -> NewEntry {
        fill(&mut new.full_name, &self.full_name);
        fill(&mut new.identifier, &self.identifier);
        fill(&mut new.role, &self.role);
        fill(&mut new.organization, &self.organization);
        fill(&mut new.municipality, &self.municipality);
        fill(&mut new.phone, &self.phone);
        new
    }
}

/// Look up a prefill for `identifier`.
#[must_use]
pub fn resolve(entries: &[Entry], identifier: &str) -> Option<Prefill> {
    find_by_identifier(entries, identifier).map(Prefill::from_entry)
}

fn fill(field: &mut String, value: &str) {
    if field.trim().is_empty() {
        value.clone_into(field);
    }
}
