//! Content history: snapshots of the Content singleton and rollback records.
//!
//! A snapshot is a flat `field → value` map of every editable field. One is
//! appended to the history log immediately before each mutation of the
//! Content row, so the log doubles as an undo stack. Rolling back is itself a
//! mutation and is snapshotted first, which gives a redo path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  content::{Content, ContentField, ContentFields},
};

/// Description used when an admin takes a backup by hand.
pub const MANUAL_BACKUP: &str = "Manual backup";

/// Author recorded when no admin name is known.
pub const DEFAULT_AUTHOR: &str = "admin";

/// Maximum entries shown on the history page.
pub const HISTORY_PAGE_SIZE: usize = 20;

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Serialised copy of every editable Content field.
///
/// Values are optional so that snapshots written with `null` values still
/// load; a `null` restores as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Option<String>>);

impl Snapshot {
  pub fn capture(fields: &ContentFields) -> Self {
    Self(
      ContentField::ALL
        .iter()
        .map(|f| (f.as_str().to_owned(), Some(fields.get(*f).to_owned())))
        .collect(),
    )
  }

  pub fn get(&self, field: ContentField) -> Option<&str> {
    self
      .0
      .get(field.as_str())
      .map(|v| v.as_deref().unwrap_or_default())
  }

  /// Overwrite `fields` with the stored values.
  ///
  /// Keys that are not Content fields are skipped; fields absent from the
  /// snapshot keep their current value. Returns the number of fields written.
  pub fn restore_into(&self, fields: &mut ContentFields) -> usize {
    let mut restored = 0;
    for (key, value) in &self.0 {
      if let Ok(field) = key.parse::<ContentField>() {
        fields.set(field, value.clone().unwrap_or_default());
        restored += 1;
      }
    }
    restored
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }
}

// ─── Log entries ─────────────────────────────────────────────────────────────

/// Why a snapshot was taken and by whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNote {
  pub description: String,
  pub author:      String,
}

impl ChangeNote {
  pub fn new(description: impl Into<String>, author: impl Into<String>) -> Self {
    Self { description: description.into(), author: author.into() }
  }
}

/// One row of the append-only history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub id:          i64,
  pub snapshot:    Snapshot,
  pub description: String,
  pub created_by:  String,
  pub created_at:  DateTime<Utc>,
}

/// Description recorded for the pre-rollback backup.
pub fn rollback_reason(target: &HistoryEntry) -> String {
  format!(
    "Before rollback to version from {}",
    target.created_at.format("%Y-%m-%d %H:%M:%S")
  )
}

/// Outcome of a successful rollback.
#[derive(Debug, Clone)]
pub struct Rollback {
  /// Snapshot of the state that was overwritten.
  pub backup:   HistoryEntry,
  /// The entry whose values were restored.
  pub restored: HistoryEntry,
  /// The Content row after restoration.
  pub content:  Content,
}
