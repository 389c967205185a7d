use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Entry, EntryKind};
use crate::path::{RemotePath, SEPARATOR};

// =============================================================================
// Wire Types
// =============================================================================

/// Item record as returned by `GET /api/browse/{id}/list` and `/info`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryPayload {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_readable: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

/// Listing record as returned by `GET /api/browse/{id}/list`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListingPayload {
    #[serde(default)]
    pub path: String,
    pub items: Vec<EntryPayload>,
    #[serde(default)]
    pub total: usize,
}

fn default_true() -> bool {
    true
}

/// Accept RFC 3339 timestamps as well as offset-less ISO timestamps
/// (interpreted as UTC), which is what the server emits for naive datetimes.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

impl EntryPayload {
    /// Convert into a normalized [`Entry`].
    ///
    /// Returns `None` if the name cannot be a single path segment.
    /// Directory records lose `size` and `mime_type`.
    pub fn into_entry(self) -> Option<Entry> {
        if matches!(self.name.as_str(), "" | "." | "..")
            || self.name.contains(SEPARATOR)
            || self.name.contains('\0')
        {
            return None;
        }
        let is_dir = self.kind == EntryKind::Directory;
        Some(Entry {
            hidden: self.is_hidden || self.name.starts_with('.'),
            name: self.name,
            kind: self.kind,
            size: if is_dir { None } else { self.size },
            modified: self.modified_at,
            readable: self.is_readable,
            mime_type: if is_dir { None } else { self.mime_type },
        })
    }
}

// =============================================================================
// DirectoryListing
// =============================================================================

/// The materialized contents of one directory.
///
/// Entries keep the order in which the remote returned them.
/// `total` always equals `entries.len()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryListing {
    pub path: RemotePath,
    pub entries: Vec<Entry>,
    pub total: usize,
}

impl DirectoryListing {
    pub fn new(path: RemotePath, entries: Vec<Entry>) -> Self {
        let total = entries.len();
        Self {
            path,
            entries,
            total,
        }
    }

    /// Normalize a wire listing.
    ///
    /// Malformed and duplicate names are dropped (first occurrence wins).
    pub fn from_payload(path: RemotePath, payload: ListingPayload) -> Self {
        let reported = payload.total;
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(payload.items.len());

        for item in payload.items {
            let raw_name = item.name.clone();
            match item.into_entry() {
                Some(entry) if seen.insert(entry.name.clone()) => entries.push(entry),
                Some(entry) => {
                    log::warn!("dropping duplicate entry {:?} in {}", entry.name, path)
                }
                None => log::warn!("dropping malformed entry {:?} in {}", raw_name, path),
            }
        }

        if reported != 0 && reported != entries.len() {
            log::debug!(
                "listing {} reported total {} but holds {} entries",
                path,
                reported,
                entries.len()
            );
        }

        Self::new(path, entries)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Insert or replace by name. Replacement keeps the original position.
    pub fn upsert(&mut self, entry: Entry) {
        match self.position(&entry.name) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
        self.total = self.entries.len();
    }

    /// Remove by name, returning the removed entry if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        let idx = self.position(name)?;
        let removed = self.entries.remove(idx);
        self.total = self.entries.len();
        Some(removed)
    }
}
