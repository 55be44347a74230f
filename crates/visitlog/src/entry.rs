//! Core entry types for visitlog.
//!
//! An [`Entry`] is one logged visit. The JSON shape keeps the keys used by
//! existing backup files (`nome`, `cpf`, `funcao`, ...) so the local payload
//! and the import/export document stay interchangeable.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Display format of [`Entry::entry_timestamp`], truncated to the second.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Current version of the entry schema.
///
/// Version 1 had no identifier field; version 2 added it.
pub const SCHEMA_VERSION: u32 = 2;

/// Stable identifier of an entry, assigned by the store at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wrap an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-derived id source that never repeats within a session.
///
/// Ids are milliseconds since the epoch; when two entries land in the same
/// millisecond the later one is bumped past the previous id.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Create a generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next id for an entry created at `now_millis`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] once an id of `i64::MAX` has been handed
    /// out or observed, since nothing can sort after it.
    pub fn next_id(&mut self, now_millis: i64) -> Result<EntryId> {
        let floor = self
            .last
            .checked_add(1)
            .ok_or_else(|| Error::internal("entry id space exhausted"))?;
        let id = now_millis.max(floor);
        self.last = id;
        Ok(EntryId(id.to_string()))
    }

    /// Make sure future ids sort after every numeric id in `existing`.
    pub fn observe<'a>(&mut self, existing: impl IntoIterator<Item = &'a EntryId>) {
        for id in existing {
            if let Ok(n) = id.as_str().parse::<i64>() {
                self.last = self.last.max(n);
            }
        }
    }
}

/// One logged visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier, immutable after creation.
    pub id: EntryId,

    /// Full name of the visitor.
    #[serde(rename = "nome")]
    pub full_name: String,

    /// National ID (CPF) of the visitor.
    #[serde(rename = "cpf", default)]
    pub identifier: String,

    /// Role or job title.
    #[serde(rename = "funcao")]
    pub role: String,

    /// Organization the visitor represents.
    #[serde(rename = "orgao")]
    pub organization: String,

    /// Municipality, empty when not given.
    #[serde(rename = "municipio", default)]
    pub municipality: String,

    /// Phone number, empty when not given.
    #[serde(rename = "telefone", default)]
    pub phone: String,

    /// Local date and time of entry, formatted with [`TIMESTAMP_FORMAT`].
    #[serde(rename = "dataHoraEntrada")]
    pub entry_timestamp: String,

    /// Embedded photo as a base64 data URI.
    #[serde(
        rename = "foto",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo: Option<String>,
}

impl Entry {
    /// Build an entry from a submission, stamping it with `at`.
    #[must_use]
    pub fn from_new<Tz>(id: EntryId, new: NewEntry, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            id,
            full_name: new.full_name,
            identifier: new.identifier,
            role: new.role,
            organization: new.organization,
            municipality: new.municipality,
            phone: new.phone,
            entry_timestamp: format_timestamp(at),
            photo: new.photo.filter(|p| !p.is_empty()),
        }
    }

    /// The date portion of the timestamp (everything before the first comma).
    #[must_use]
    pub fn entry_date_text(&self) -> &str {
        self.entry_timestamp
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// First word of the visitor's name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or_default()
    }

    /// Whether a photo is attached.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }
}

/// An entry as submitted, before the store assigns id and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
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
    /// Embedded photo as a base64 data URI.
    pub photo: Option<String>,
}

/// Required-field policy applied at the submission and import boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySchema {
    /// Schema version the policy corresponds to.
    pub version: u32,
    /// Whether the identifier must be present.
    pub identifier_required: bool,
}

impl Default for EntrySchema {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            identifier_required: true,
        }
    }
}

impl EntrySchema {
    /// Schema with an explicit identifier policy.
    #[must_use]
    pub fn with_identifier_required(identifier_required: bool) -> Self {
        Self {
            identifier_required,
            ..Self::default()
        }
    }

    /// Check a submission for missing required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming every missing field.
    pub fn validate(&self, new: &NewEntry) -> Result<()> {
        let missing = self.missing_fields(
            &new.full_name,
            &new.identifier,
            &new.role,
            &new.organization,
        );
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { missing })
        }
    }

    /// Check a full collection, as loaded from an import file.
    ///
    /// Returns a description of the first problem found.
    ///
    /// # Errors
    ///
    /// Fails on an empty or duplicate id, or on missing required fields.
    pub fn validate_all(&self, entries: &[Entry]) -> std::result::Result<(), String> {
        let mut seen = HashSet::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            if entry.id.as_str().trim().is_empty() {
                return Err(format!("entry #{} has an empty id", index + 1));
            }
            if !seen.insert(&entry.id) {
                return Err(format!("duplicate entry id {}", entry.id));
            }
            let missing = self.missing_fields(
                &entry.full_name,
                &entry.identifier,
                &entry.role,
                &entry.organization,
            );
            if !missing.is_empty() {
                return Err(format!(
                    "entry {} is missing {}",
                    entry.id,
                    missing.join(", ")
                ));
            }
        }
        Ok(())
    }

    fn missing_fields(
        &self,
        full_name: &str,
        identifier: &str,
        role: &str,
        organization: &str,
    ) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if full_name.trim().is_empty() {
            missing.push("name");
        }
        if self.identifier_required && identifier.trim().is_empty() {
            missing.push("identifier");
        }
        if role.trim().is_empty() {
            missing.push("role");
        }
        if organization.trim().is_empty() {
            missing.push("organization");
        }
        missing
    }
}

/// Format a point in time the way entries store it.
#[must_use]
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_new() -> NewEntry {
        NewEntry {
            full_name: "Ana Souza".to_string(),
            identifier: "111.222.333-44".to_string(),
            role: "Engineer".to_string(),
            organization: "Prefeitura".to_string(),
            municipality: "Recife".to_string(),
            phone: String::new(),
            photo: None,
        }
    }

    #[test]
    fn test_id_generator_is_strictly_increasing() {
        let mut ids = IdGenerator::new();
        let a = ids.next_id(1_000).unwrap();
        let b = ids.next_id(1_000).unwrap();
        let c = ids.next_id(999).unwrap();
        let d = ids.next_id(5_000).unwrap();
        assert_eq!(a.as_str(), "1000");
        assert_eq!(b.as_str(), "1001");
        assert_eq!(c.as_str(), "1002");
        assert_eq!(d.as_str(), "5000");
    }

    #[test]
    fn test_id_generator_observes_existing_ids() {
        let mut ids = IdGenerator::new();
        let existing = [EntryId::new("9000"), EntryId::new("not-a-number")];
        ids.observe(existing.iter());
        assert_eq!(ids.next_id(10).unwrap().as_str(), "9001");
    }

    #[test]
    fn test_id_generator_fails_after_max_id() {
        let mut ids = IdGenerator::new();
        let max = EntryId::new(i64::MAX.to_string());
        ids.observe([&max]);

        let err = ids.next_id(1_000).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        // Still exhausted on the next call, never wraps around.
        assert!(ids.next_id(i64::MAX).is_err());
    }

    #[test]
    fn test_id_generator_hands_out_max_once() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id(i64::MAX).unwrap().as_str(), i64::MAX.to_string());
        assert!(ids.next_id(0).is_err());
    }

    #[test]
    fn test_from_new_stamps_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let entry = Entry::from_new(EntryId::new("1"), sample_new(), &at);
        assert_eq!(entry.entry_timestamp, "01/05/2024, 10:00:00");
        assert_eq!(entry.entry_date_text(), "01/05/2024");
        assert_eq!(entry.first_name(), "Ana");
    }

    #[test]
    fn test_from_new_drops_empty_photo() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut new = sample_new();
        new.photo = Some(String::new());
        let entry = Entry::from_new(EntryId::new("1"), new, &at);
        assert!(!entry.has_photo());
    }

    #[test]
    fn test_json_uses_backup_keys() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let entry = Entry::from_new(EntryId::new("1714557600000"), sample_new(), &at);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "1714557600000");
        assert_eq!(json["nome"], "Ana Souza");
        assert_eq!(json["cpf"], "111.222.333-44");
        assert_eq!(json["funcao"], "Engineer");
        assert_eq!(json["orgao"], "Prefeitura");
        assert_eq!(json["dataHoraEntrada"], "01/05/2024, 10:00:00");
        assert!(json.get("foto").is_none());
    }

    #[test]
    fn test_deserialize_legacy_entry_without_identifier() {
        let json = r#"{
            "id": "1",
            "nome": "Bruno",
            "funcao": "Visitor",
            "orgao": "ACME",
            "municipio": "",
            "telefone": "",
            "dataHoraEntrada": "02/05/2024, 09:00:00",
            "foto": ""
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.identifier, "");
        assert!(entry.photo.is_none());
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let schema = EntrySchema::default();
        let err = schema.validate(&NewEntry::default()).unwrap_err();
        match err {
            Error::Validation { missing } => {
                assert_eq!(missing, vec!["name", "identifier", "role", "organization"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_identifier_optional() {
        let schema = EntrySchema::with_identifier_required(false);
        let mut new = sample_new();
        new.identifier = String::new();
        assert!(schema.validate(&new).is_ok());
        assert!(EntrySchema::default().validate(&new).is_err());
    }

    #[test]
    fn test_validate_whitespace_counts_as_missing() {
        let mut new = sample_new();
        new.role = "   ".to_string();
        assert!(EntrySchema::default().validate(&new).is_err());
    }

    #[test]
    fn test_validate_all_rejects_duplicate_ids() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let a = Entry::from_new(EntryId::new("1"), sample_new(), &at);
        let b = a.clone();
        let err = EntrySchema::default().validate_all(&[a, b]).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_validate_all_accepts_valid_set() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let a = Entry::from_new(EntryId::new("1"), sample_new(), &at);
        let b = Entry::from_new(EntryId::new("2"), sample_new(), &at);
        assert!(EntrySchema::default().validate_all(&[a, b]).is_ok());
    }
}
