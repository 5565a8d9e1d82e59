//! The `SiteStore` and `SessionStore` traits.
//!
//! Implemented by storage backends (e.g. `vitrine-store-sqlite`). The web
//! layer depends on these abstractions, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  admin::Admin,
  catalog::{CatalogItem, CatalogKind, NewCatalogItem, ProductImage},
  content::{Content, ContentFields, ContentPatch},
  history::{ChangeNote, HistoryEntry, Rollback},
  session::{Flash, Session},
};

/// Abstraction over the site's relational store.
///
/// Every mutation of the Content row appends a history entry first, holding
/// the values about to be overwritten. There is no concurrency control:
/// concurrent edits resolve as last-write-wins.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SiteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Content ───────────────────────────────────────────────────────────

  /// The canonical Content row, or `None` before first boot.
  fn content(
    &self,
  ) -> impl Future<Output = Result<Option<Content>, Self::Error>> + Send + '_;

  /// Return the canonical row, inserting one with `defaults` if none exists.
  fn ensure_content(
    &self,
    defaults: ContentFields,
  ) -> impl Future<Output = Result<Content, Self::Error>> + Send + '_;

  /// Snapshot the current row under `note`, then overwrite the fields
  /// present in `patch`. Returns the updated row and the new history entry.
  fn update_content(
    &self,
    patch: ContentPatch,
    note: ChangeNote,
  ) -> impl Future<Output = Result<(Content, HistoryEntry), Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Append a snapshot of the current Content row.
  fn snapshot(
    &self,
    note: ChangeNote,
  ) -> impl Future<Output = Result<HistoryEntry, Self::Error>> + Send + '_;

  /// Most recent entries first.
  fn list_history(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  fn get_history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<HistoryEntry>, Self::Error>> + Send + '_;

  /// Restore the Content row from entry `id`, snapshotting the current state
  /// first (authored by `author`). Returns `None`, with no change made, if
  /// the entry does not exist.
  fn rollback(
    &self,
    id: i64,
    author: String,
  ) -> impl Future<Output = Result<Option<Rollback>, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such entry.
  fn delete_history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Features & products ───────────────────────────────────────────────

  /// All items of `kind` sorted by display order, then id.
  fn list_items(
    &self,
    kind: CatalogKind,
  ) -> impl Future<Output = Result<Vec<CatalogItem>, Self::Error>> + Send + '_;

  fn count_items(
    &self,
    kind: CatalogKind,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    kind: CatalogKind,
    id: i64,
  ) -> impl Future<Output = Result<Option<CatalogItem>, Self::Error>> + Send + '_;

  fn add_item(
    &self,
    kind: CatalogKind,
    item: NewCatalogItem,
  ) -> impl Future<Output = Result<CatalogItem, Self::Error>> + Send + '_;

  /// Overwrite every column of an existing item. Returns `false` if it is gone.
  fn save_item(
    &self,
    item: CatalogItem,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete and return the item (and, for products, its gallery rows).
  fn delete_item(
    &self,
    kind: CatalogKind,
    id: i64,
  ) -> impl Future<Output = Result<Option<CatalogItem>, Self::Error>> + Send + '_;

  // ── Product gallery ───────────────────────────────────────────────────

  /// Append an image to the end of a product's gallery.
  fn add_product_image(
    &self,
    product_id: i64,
    image: String,
  ) -> impl Future<Output = Result<ProductImage, Self::Error>> + Send + '_;

  fn list_product_images(
    &self,
    product_id: i64,
  ) -> impl Future<Output = Result<Vec<ProductImage>, Self::Error>> + Send + '_;

  fn delete_product_image(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ProductImage>, Self::Error>> + Send + '_;

  // ── Admins ────────────────────────────────────────────────────────────

  fn find_admin<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + 'a;

  fn count_admins(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn create_admin(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Admin, Self::Error>> + Send + '_;
}

/// Persistence for admin sessions and their pending flash messages.
pub trait SessionStore: SiteStore {
  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up a session by token hash; expired sessions are still returned.
  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Move a session's expiry. Returns `false` if the session is gone.
  fn touch_session<'a>(
    &'a self,
    token_hash: &'a str,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Drop every session whose expiry is at or before `now`.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn push_flash<'a>(
    &'a self,
    token_hash: &'a str,
    flash: Flash,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Return and clear the pending flash messages, oldest first.
  fn take_flashes<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Vec<Flash>, Self::Error>> + Send + 'a;
}
