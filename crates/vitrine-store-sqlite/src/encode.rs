//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order equals chronological order. Snapshots and flash
//! queues are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use vitrine_core::{
  catalog::{CatalogItem, CatalogKind, ProductImage},
  content::{Content, ContentField, ContentFields},
  history::{HistoryEntry, Snapshot},
  session::{Flash, Session},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub fn catalog_table(kind: CatalogKind) -> &'static str {
  match kind {
    CatalogKind::Feature => "features",
    CatalogKind::Product => "products",
  }
}

/// Comma-separated Content columns in [`ContentField::ALL`] order.
pub fn content_columns() -> String {
  ContentField::ALL
    .iter()
    .map(|f| f.as_str())
    .collect::<Vec<_>>()
    .join(", ")
}

/// `col = ?1, col = ?2, …` over every Content column.
pub fn content_assignments() -> String {
  ContentField::ALL
    .iter()
    .enumerate()
    .map(|(i, f)| format!("{} = ?{}", f.as_str(), i + 1))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Flashes ─────────────────────────────────────────────────────────────────

pub fn encode_flashes(flashes: &[Flash]) -> Result<String> {
  Ok(serde_json::to_string(flashes)?)
}

pub fn decode_flashes(s: &str) -> Result<Vec<Flash>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `content` row.
pub struct RawContent {
  pub id:         i64,
  /// One value per [`ContentField::ALL`] entry, in order.
  pub values:     Vec<Option<String>>,
  pub updated_at: String,
}

impl RawContent {
  /// Read `id, <content columns>, updated_at` from a row.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    let n = ContentField::ALL.len();
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
      values.push(row.get(i + 1)?);
    }
    Ok(Self { id: row.get(0)?, values, updated_at: row.get(n + 1)? })
  }

  pub fn fields(&self) -> ContentFields {
    let mut fields = ContentFields::default();
    for (field, value) in ContentField::ALL.iter().zip(&self.values) {
      fields.set(*field, value.clone().unwrap_or_default());
    }
    fields
  }

  pub fn into_content(self) -> Result<Content> {
    Ok(Content {
      id:         self.id,
      fields:     self.fields(),
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `content_history` row.
pub struct RawHistory {
  pub id:          i64,
  pub snapshot:    String,
  pub description: String,
  pub created_by:  String,
  pub created_at:  String,
}

impl RawHistory {
  pub const COLUMNS: &'static str =
    "id, content_snapshot, description, created_by, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      snapshot:    row.get(1)?,
      description: row.get(2)?,
      created_by:  row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:          self.id,
      snapshot:    Snapshot::from_json(&self.snapshot)?,
      description: self.description,
      created_by:  self.created_by,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// A `features` or `products` row. Integer and text columns need no decoding.
pub struct RawItem {
  pub id:            i64,
  pub display_order: i64,
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub icon:          Option<String>,
  pub image:         Option<String>,
}

impl RawItem {
  pub const COLUMNS: &'static str = "id, display_order, title, description, icon, image";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      display_order: row.get(1)?,
      title:         row.get(2)?,
      description:   row.get(3)?,
      icon:          row.get(4)?,
      image:         row.get(5)?,
    })
  }

  pub fn into_item(self, kind: CatalogKind) -> CatalogItem {
    CatalogItem {
      id: self.id,
      kind,
      display_order: self.display_order,
      title: self.title.unwrap_or_default(),
      description: self.description.unwrap_or_default(),
      icon: self.icon.filter(|s| !s.is_empty()),
      image: self.image.filter(|s| !s.is_empty()),
    }
  }
}

pub struct RawProductImage {
  pub id:            i64,
  pub product_id:    i64,
  pub image:         String,
  pub display_order: i64,
  pub created_at:    String,
}

impl RawProductImage {
  pub const COLUMNS: &'static str = "id, product_id, image, display_order, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      product_id:    row.get(1)?,
      image:         row.get(2)?,
      display_order: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_image(self) -> Result<ProductImage> {
    Ok(ProductImage {
      id:            self.id,
      product_id:    self.product_id,
      image:         self.image,
      display_order: self.display_order,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawSession {
  pub token_hash: String,
  pub username:   Option<String>,
  pub csrf_token: String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub const COLUMNS: &'static str = "token_hash, username, csrf_token, created_at, expires_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      token_hash: row.get(0)?,
      username:   row.get(1)?,
      csrf_token: row.get(2)?,
      created_at: row.get(3)?,
      expires_at: row.get(4)?,
    })
  }

  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      username:   self.username,
      csrf_token: self.csrf_token,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1500);
    let c = a + chrono::Duration::seconds(1);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec, "{ea} {eb} {ec}");
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn assignments_cover_every_column() {
    let sql = content_assignments();
    assert!(sql.starts_with("hero_label = ?1, hero_title = ?2"));
    assert!(sql.ends_with(&format!("footer_text = ?{}", ContentField::ALL.len())));
  }
}
