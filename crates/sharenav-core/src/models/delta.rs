use serde::{Deserialize, Serialize};

use super::Entry;

/// Kind of change reported for a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
    Renamed,
}

/// An incremental change to a previously fetched directory.
///
/// Applying the same delta twice yields the same listing as applying it
/// once, so deltas can safely interleave with a full listing refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta {
    pub change: ChangeKind,
    /// Affected entry; the new name for renames.
    pub entry_name: String,
    /// Old name, renames only.
    pub previous_name: Option<String>,
    /// Full record when the server sent one.
    pub entry: Option<Entry>,
}

impl Delta {
    pub fn created(entry: Entry) -> Self {
        Self {
            change: ChangeKind::Created,
            entry_name: entry.name.clone(),
            previous_name: None,
            entry: Some(entry),
        }
    }

    pub fn updated(entry: Entry) -> Self {
        Self {
            change: ChangeKind::Updated,
            entry_name: entry.name.clone(),
            previous_name: None,
            entry: Some(entry),
        }
    }

    pub fn removed(name: impl Into<String>) -> Self {
        Self {
            change: ChangeKind::Removed,
            entry_name: name.into(),
            previous_name: None,
            entry: None,
        }
    }

    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            change: ChangeKind::Renamed,
            entry_name: to.into(),
            previous_name: Some(from.into()),
            entry: None,
        }
    }
}
