//! [`SqliteStore`] — the SQLite implementation of [`SiteStore`] and
//! [`SessionStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};

use vitrine_core::{
  admin::Admin,
  catalog::{CatalogItem, CatalogKind, NewCatalogItem, ProductImage},
  content::{Content, ContentField, ContentFields, ContentPatch},
  history::{ChangeNote, HistoryEntry, Rollback, Snapshot, rollback_reason},
  session::{Flash, Session},
  store::{SessionStore, SiteStore},
};

use crate::{
  Error, Result,
  encode::{
    RawContent, RawHistory, RawItem, RawProductImage, RawSession, catalog_table,
    content_assignments, content_columns, decode_dt, decode_flashes, encode_dt, encode_flashes,
  },
  schema::SCHEMA,
};

/// An edit applied to the Content fields inside the snapshot transaction.
type Mutation = Box<dyn FnOnce(&mut ContentFields) + Send>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// The site store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Append a snapshot of the live row, then optionally mutate and persist
  /// it, all in one transaction.
  async fn snapshot_then(
    &self,
    note: ChangeNote,
    mutation: Option<Mutation>,
  ) -> Result<(Content, HistoryEntry)> {
    let now = Utc::now();
    let at = encode_dt(now);
    let description = note.description.clone();
    let author = note.author.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = read_content(&tx)? else {
          return Ok(None);
        };

        let mut fields = raw.fields();
        let snapshot = Snapshot::capture(&fields);
        let json = serde_json::to_string(&snapshot).map_err(other)?;
        let history_id = append_history(&tx, &json, &description, &author, &at)?;

        let updated_at = match mutation {
          Some(apply) => {
            apply(&mut fields);
            write_content(&tx, raw.id, &fields, &at)?;
            at
          }
          None => raw.updated_at,
        };

        tx.commit()?;
        Ok(Some((raw.id, fields, updated_at, snapshot, history_id)))
      })
      .await?;

    let (content_id, fields, updated_at, snapshot, history_id) =
      outcome.ok_or(Error::ContentMissing)?;

    let content = Content {
      id: content_id,
      fields,
      updated_at: decode_dt(&updated_at)?,
    };
    let entry = HistoryEntry {
      id:          history_id,
      snapshot,
      description: note.description,
      created_by:  note.author,
      created_at:  now,
    };
    Ok((content, entry))
  }
}

// ─── Connection helpers ──────────────────────────────────────────────────────

fn other<E: std::error::Error + Send + Sync + 'static>(e: E) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// The canonical Content row: lowest id wins.
fn read_content(conn: &rusqlite::Connection) -> rusqlite::Result<Option<RawContent>> {
  let sql = format!(
    "SELECT id, {}, updated_at FROM content ORDER BY id LIMIT 1",
    content_columns()
  );
  conn.query_row(&sql, [], RawContent::from_row).optional()
}

fn write_content(
  conn: &rusqlite::Connection,
  id: i64,
  fields: &ContentFields,
  updated_at: &str,
) -> rusqlite::Result<()> {
  let n = ContentField::ALL.len();
  let sql = format!(
    "UPDATE content SET {}, updated_at = ?{} WHERE id = ?{}",
    content_assignments(),
    n + 1,
    n + 2,
  );
  let mut values: Vec<Value> = ContentField::ALL
    .iter()
    .map(|f| Value::Text(fields.get(*f).to_owned()))
    .collect();
  values.push(Value::Text(updated_at.to_owned()));
  values.push(Value::Integer(id));
  conn.execute(&sql, rusqlite::params_from_iter(values))?;
  Ok(())
}

fn append_history(
  conn: &rusqlite::Connection,
  snapshot_json: &str,
  description: &str,
  author: &str,
  created_at: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO content_history (content_snapshot, description, created_by, created_at)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![snapshot_json, description, author, created_at],
  )?;
  Ok(conn.last_insert_rowid())
}

// ─── SiteStore impl ──────────────────────────────────────────────────────────

impl SiteStore for SqliteStore {
  type Error = Error;

  // ── Content ───────────────────────────────────────────────────────────────

  async fn content(&self) -> Result<Option<Content>> {
    let raw = self
      .conn
      .call(|conn| Ok(read_content(conn)?))
      .await?;
    raw.map(RawContent::into_content).transpose()
  }

  async fn ensure_content(&self, defaults: ContentFields) -> Result<Content> {
    let at = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(existing) = read_content(&tx)? {
          return Ok(existing);
        }

        let n = ContentField::ALL.len();
        let placeholders = (1..=n + 1)
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let sql = format!(
          "INSERT INTO content ({}, updated_at) VALUES ({placeholders})",
          content_columns()
        );
        let mut values: Vec<Value> = ContentField::ALL
          .iter()
          .map(|f| Value::Text(defaults.get(*f).to_owned()))
          .collect();
        values.push(Value::Text(at));
        tx.execute(&sql, rusqlite::params_from_iter(values))?;

        let created = read_content(&tx)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(created)
      })
      .await?;

    raw.into_content()
  }

  async fn update_content(
    &self,
    patch: ContentPatch,
    note: ChangeNote,
  ) -> Result<(Content, HistoryEntry)> {
    let mutation: Mutation = Box::new(move |fields: &mut ContentFields| patch.apply_to(fields));
    self.snapshot_then(note, Some(mutation)).await
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn snapshot(&self, note: ChangeNote) -> Result<HistoryEntry> {
    let (_, entry) = self.snapshot_then(note, None).await?;
    Ok(entry)
  }

  async fn list_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
    let limit = limit as i64;

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM content_history ORDER BY id DESC LIMIT ?1",
          RawHistory::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_entry).collect()
  }

  async fn get_history(&self, id: i64) -> Result<Option<HistoryEntry>> {
    let raw: Option<RawHistory> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM content_history WHERE id = ?1", RawHistory::COLUMNS);
        Ok(conn.query_row(&sql, rusqlite::params![id], RawHistory::from_row).optional()?)
      })
      .await?;

    raw.map(RawHistory::into_entry).transpose()
  }

  async fn rollback(&self, id: i64, author: String) -> Result<Option<Rollback>> {
    let Some(target) = self.get_history(id).await? else {
      return Ok(None);
    };

    let note = ChangeNote::new(rollback_reason(&target), author);
    let restore = target.snapshot.clone();
    let mutation: Mutation = Box::new(move |fields: &mut ContentFields| {
      restore.restore_into(fields);
    });
    let (content, backup) = self.snapshot_then(note, Some(mutation)).await?;

    Ok(Some(Rollback { backup, restored: target, content }))
  }

  async fn delete_history(&self, id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM content_history WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Features & products ───────────────────────────────────────────────────

  async fn list_items(&self, kind: CatalogKind) -> Result<Vec<CatalogItem>> {
    let table = catalog_table(kind);

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM {table} ORDER BY display_order, id",
          RawItem::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(|r| r.into_item(kind)).collect())
  }

  async fn count_items(&self, kind: CatalogKind) -> Result<usize> {
    let table = catalog_table(kind);
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as usize)
  }

  async fn get_item(&self, kind: CatalogKind, id: i64) -> Result<Option<CatalogItem>> {
    let table = catalog_table(kind);
    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM {table} WHERE id = ?1", RawItem::COLUMNS);
        Ok(conn.query_row(&sql, rusqlite::params![id], RawItem::from_row).optional()?)
      })
      .await?;
    Ok(raw.map(|r| r.into_item(kind)))
  }

  async fn add_item(&self, kind: CatalogKind, item: NewCatalogItem) -> Result<CatalogItem> {
    let table = catalog_table(kind);
    let row = item.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO {table} (display_order, title, description, icon, image)
             VALUES (?1, ?2, ?3, ?4, ?5)"
          ),
          rusqlite::params![row.display_order, row.title, row.description, row.icon, row.image],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(item.into_item(id, kind))
  }

  async fn save_item(&self, item: CatalogItem) -> Result<bool> {
    let table = catalog_table(item.kind);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!(
            "UPDATE {table}
             SET display_order = ?1, title = ?2, description = ?3, icon = ?4, image = ?5
             WHERE id = ?6"
          ),
          rusqlite::params![
            item.display_order,
            item.title,
            item.description,
            item.icon,
            item.image,
            item.id,
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn delete_item(&self, kind: CatalogKind, id: i64) -> Result<Option<CatalogItem>> {
    let table = catalog_table(kind);
    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!("SELECT {} FROM {table} WHERE id = ?1", RawItem::COLUMNS);
        let found = tx.query_row(&sql, rusqlite::params![id], RawItem::from_row).optional()?;
        if found.is_some() {
          // Gallery rows go with their product via ON DELETE CASCADE.
          tx.execute(&format!("DELETE FROM {table} WHERE id = ?1"), rusqlite::params![id])?;
        }
        tx.commit()?;
        Ok(found)
      })
      .await?;
    Ok(raw.map(|r| r.into_item(kind)))
  }

  // ── Product gallery ───────────────────────────────────────────────────────

  async fn add_product_image(&self, product_id: i64, image: String) -> Result<ProductImage> {
    let now = Utc::now();
    let at = encode_dt(now);
    let stored = image.clone();

    let (id, display_order) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let next: i64 = tx.query_row(
          "SELECT COALESCE(MAX(display_order), 0) + 1 FROM product_images WHERE product_id = ?1",
          rusqlite::params![product_id],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO product_images (product_id, image, display_order, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![product_id, stored, next, at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok((id, next))
      })
      .await?;

    Ok(ProductImage { id, product_id, image, display_order, created_at: now })
  }

  async fn list_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>> {
    let raws: Vec<RawProductImage> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM product_images WHERE product_id = ?1 ORDER BY display_order, id",
          RawProductImage::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![product_id], RawProductImage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProductImage::into_image).collect()
  }

  async fn delete_product_image(&self, id: i64) -> Result<Option<ProductImage>> {
    let raw: Option<RawProductImage> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql = format!("SELECT {} FROM product_images WHERE id = ?1", RawProductImage::COLUMNS);
        let found = tx
          .query_row(&sql, rusqlite::params![id], RawProductImage::from_row)
          .optional()?;
        if found.is_some() {
          tx.execute("DELETE FROM product_images WHERE id = ?1", rusqlite::params![id])?;
        }
        tx.commit()?;
        Ok(found)
      })
      .await?;

    raw.map(RawProductImage::into_image).transpose()
  }

  // ── Admins ────────────────────────────────────────────────────────────────

  async fn find_admin(&self, username: &str) -> Result<Option<Admin>> {
    let username = username.to_owned();
    let admin = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, username, password_hash FROM admins WHERE username = ?1",
            rusqlite::params![username],
            |row| {
              Ok(Admin {
                id:            row.get(0)?,
                username:      row.get(1)?,
                password_hash: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(admin)
  }

  async fn count_admins(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |r| r.get(0))?))
      .await?;
    Ok(count as usize)
  }

  async fn create_admin(&self, username: String, password_hash: String) -> Result<Admin> {
    let (name, hash) = (username.clone(), password_hash.clone());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO admins (username, password_hash) VALUES (?1, ?2)",
          rusqlite::params![name, hash],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Admin { id, username, password_hash })
  }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  async fn create_session(&self, session: Session) -> Result<()> {
    let created_at = encode_dt(session.created_at);
    let expires_at = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, username, csrf_token, flashes, created_at, expires_at)
           VALUES (?1, ?2, ?3, '[]', ?4, ?5)",
          rusqlite::params![
            session.token_hash,
            session.username,
            session.csrf_token,
            created_at,
            expires_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let token_hash = token_hash.to_owned();
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM sessions WHERE token_hash = ?1", RawSession::COLUMNS);
        Ok(conn.query_row(&sql, rusqlite::params![token_hash], RawSession::from_row).optional()?)
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<()> {
    let token_hash = token_hash.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", rusqlite::params![token_hash])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn touch_session(&self, token_hash: &str, expires_at: DateTime<Utc>) -> Result<bool> {
    let token_hash = token_hash.to_owned();
    let expires_at = encode_dt(expires_at);
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET expires_at = ?1 WHERE token_hash = ?2",
          rusqlite::params![expires_at, token_hash],
        )?)
      })
      .await?;
    Ok(updated > 0)
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let now = encode_dt(now);
    let purged = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", rusqlite::params![now])?)
      })
      .await?;
    Ok(purged)
  }

  async fn push_flash(&self, token_hash: &str, flash: Flash) -> Result<()> {
    let token_hash = token_hash.to_owned();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT flashes FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| r.get(0),
          )
          .optional()?;
        // Flashing onto a vanished session is a no-op.
        let Some(current) = current else {
          return Ok(());
        };

        let mut queue = decode_flashes(&current).map_err(other)?;
        queue.push(flash);
        let encoded = encode_flashes(&queue).map_err(other)?;
        tx.execute(
          "UPDATE sessions SET flashes = ?1 WHERE token_hash = ?2",
          rusqlite::params![encoded, token_hash],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn take_flashes(&self, token_hash: &str) -> Result<Vec<Flash>> {
    let token_hash = token_hash.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT flashes FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| r.get(0),
          )
          .optional()?;
        if current.is_some() {
          tx.execute(
            "UPDATE sessions SET flashes = '[]' WHERE token_hash = ?1",
            rusqlite::params![token_hash],
          )?;
        }
        tx.commit()?;
        Ok(current)
      })
      .await?;

    match raw {
      Some(s) => decode_flashes(&s),
      None => Ok(Vec::new()),
    }
  }
}
