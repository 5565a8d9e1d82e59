//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use vitrine_core::{
  catalog::{CatalogKind, NewCatalogItem},
  content::{ContentField, ContentPatch},
  history::{ChangeNote, MANUAL_BACKUP},
  seed,
  session::{Flash, FlashLevel, Session},
  store::{SessionStore, SiteStore},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.ensure_content(seed::default_content()).await.unwrap();
  s
}

fn note(description: &str) -> ChangeNote { ChangeNote::new(description, "admin") }

fn hero_title(title: &str) -> ContentPatch {
  let mut patch = ContentPatch::new();
  patch.set(ContentField::HeroTitle, title);
  patch
}

// ─── Content ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn content_is_absent_before_first_boot() {
  let s = store().await;
  assert!(s.content().await.unwrap().is_none());
}

#[tokio::test]
async fn ensure_content_inserts_once() {
  let s = store().await;
  let first = s.ensure_content(seed::default_content()).await.unwrap();

  let mut other = seed::default_content();
  other.hero_title = "Ignored".into();
  let second = s.ensure_content(other).await.unwrap();

  assert_eq!(first.id, second.id);
  assert_eq!(second.fields, seed::default_content());
}

#[tokio::test]
async fn update_without_content_row_fails() {
  let s = store().await;
  let err = s.update_content(hero_title("x"), note("n")).await.unwrap_err();
  assert!(matches!(err, Error::ContentMissing));
}

#[tokio::test]
async fn update_snapshots_prior_values_first() {
  let s = seeded().await;
  let before = s.content().await.unwrap().unwrap();

  let (after, entry) = s
    .update_content(hero_title("New Title"), note("Before hero section update"))
    .await
    .unwrap();

  assert_eq!(after.fields.hero_title, "New Title");
  assert_eq!(after.fields.hero_label, before.fields.hero_label);
  assert_eq!(entry.description, "Before hero section update");
  assert_eq!(
    entry.snapshot.get(ContentField::HeroTitle),
    Some(before.fields.hero_title.as_str())
  );

  let history = s.list_history(20).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].id, entry.id);

  let stored = s.content().await.unwrap().unwrap();
  assert_eq!(stored.fields.hero_title, "New Title");
}

#[tokio::test]
async fn manual_snapshot_leaves_content_untouched() {
  let s = seeded().await;
  let before = s.content().await.unwrap().unwrap();

  let entry = s.snapshot(ChangeNote::new(MANUAL_BACKUP, "editor")).await.unwrap();
  assert_eq!(entry.created_by, "editor");

  let after = s.content().await.unwrap().unwrap();
  assert_eq!(after.fields, before.fields);
  assert_eq!(after.updated_at, before.updated_at);
}

// ─── History & rollback ──────────────────────────────────────────────────────

#[tokio::test]
async fn rollback_restores_pre_update_values() {
  let s = seeded().await;
  let original = s.content().await.unwrap().unwrap();

  let (_, entry) = s.update_content(hero_title("New Title"), note("edit")).await.unwrap();
  let rollback = s.rollback(entry.id, "admin".into()).await.unwrap().unwrap();

  assert_eq!(rollback.content.fields, original.fields);
  assert_eq!(rollback.restored.id, entry.id);
  assert!(rollback.backup.description.starts_with("Before rollback to version from "));
  assert_eq!(rollback.backup.snapshot.get(ContentField::HeroTitle), Some("New Title"));

  let stored = s.content().await.unwrap().unwrap();
  assert_eq!(stored.fields, original.fields);
}

#[tokio::test]
async fn rolling_back_the_rollback_returns_to_pre_rollback_state() {
  let s = seeded().await;

  let (_, first) = s.update_content(hero_title("Second"), note("one")).await.unwrap();
  s.update_content(hero_title("Third"), note("two")).await.unwrap();
  let before_rollback = s.content().await.unwrap().unwrap();

  let rb = s.rollback(first.id, "admin".into()).await.unwrap().unwrap();
  assert_ne!(rb.content.fields.hero_title, "Third");

  let redo = s.rollback(rb.backup.id, "admin".into()).await.unwrap().unwrap();
  assert_eq!(redo.content.fields, before_rollback.fields);
  assert_eq!(redo.content.fields.hero_title, "Third");
}

#[tokio::test]
async fn rollback_to_missing_entry_changes_nothing() {
  let s = seeded().await;
  let before = s.content().await.unwrap().unwrap();

  assert!(s.rollback(9999, "admin".into()).await.unwrap().is_none());

  assert!(s.list_history(20).await.unwrap().is_empty());
  assert_eq!(s.content().await.unwrap().unwrap().fields, before.fields);
}

#[tokio::test]
async fn history_lists_newest_first_with_limit() {
  let s = seeded().await;
  for i in 0..5 {
    s.update_content(hero_title(&format!("v{i}")), note(&format!("edit {i}")))
      .await
      .unwrap();
  }

  let page = s.list_history(3).await.unwrap();
  assert_eq!(page.len(), 3);
  assert_eq!(page[0].description, "edit 4");
  assert_eq!(page[2].description, "edit 2");
}

#[tokio::test]
async fn history_order_ignores_clock_steps() {
  let s = seeded().await;
  let first = s.snapshot(note("first")).await.unwrap();
  let second = s.snapshot(note("second")).await.unwrap();

  // The second entry was recorded after the wall clock stepped back a day.
  let earlier = crate::encode::encode_dt(first.created_at - Duration::days(1));
  let id = second.id;
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE content_history SET created_at = ?1 WHERE id = ?2",
        rusqlite::params![earlier, id],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let page = s.list_history(20).await.unwrap();
  assert_eq!(page[0].id, second.id);
  assert_eq!(page[1].id, first.id);
}

#[tokio::test]
async fn delete_history_entry() {
  let s = seeded().await;
  let entry = s.snapshot(note("keep?")).await.unwrap();

  assert!(s.delete_history(entry.id).await.unwrap());
  assert!(!s.delete_history(entry.id).await.unwrap());
  assert!(s.get_history(entry.id).await.unwrap().is_none());
}

// ─── Features & products ─────────────────────────────────────────────────────

fn new_item(order: i64, title: &str) -> NewCatalogItem {
  NewCatalogItem {
    display_order: order,
    title: title.into(),
    description: format!("{title} description"),
    ..Default::default()
  }
}

#[tokio::test]
async fn items_are_listed_by_display_order() {
  let s = store().await;
  s.add_item(CatalogKind::Feature, new_item(3, "C")).await.unwrap();
  s.add_item(CatalogKind::Feature, new_item(1, "A")).await.unwrap();
  s.add_item(CatalogKind::Feature, new_item(1, "B")).await.unwrap();

  let titles: Vec<_> = s
    .list_items(CatalogKind::Feature)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.title)
    .collect();
  assert_eq!(titles, ["A", "B", "C"]);
  assert_eq!(s.count_items(CatalogKind::Feature).await.unwrap(), 3);
  assert_eq!(s.count_items(CatalogKind::Product).await.unwrap(), 0);
}

#[tokio::test]
async fn save_item_updates_in_place() {
  let s = store().await;
  let mut item = s.add_item(CatalogKind::Product, new_item(1, "Laser")).await.unwrap();

  item.title = "Laser II".into();
  item.image = Some("product_x.png".into());
  assert!(s.save_item(item.clone()).await.unwrap());

  let stored = s.get_item(CatalogKind::Product, item.id).await.unwrap().unwrap();
  assert_eq!(stored, item);
}

#[tokio::test]
async fn delete_item_returns_row_once() {
  let s = store().await;
  let item = s.add_item(CatalogKind::Feature, new_item(1, "Gone")).await.unwrap();

  let deleted = s.delete_item(CatalogKind::Feature, item.id).await.unwrap();
  assert_eq!(deleted.map(|i| i.id), Some(item.id));
  assert!(s.delete_item(CatalogKind::Feature, item.id).await.unwrap().is_none());
}

#[tokio::test]
async fn kinds_live_in_separate_tables() {
  let s = store().await;
  let feature = s.add_item(CatalogKind::Feature, new_item(1, "F")).await.unwrap();
  assert!(s.get_item(CatalogKind::Product, feature.id).await.unwrap().is_none());
}

// ─── Gallery ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn gallery_images_append_in_order_and_cascade() {
  let s = store().await;
  let product = s.add_item(CatalogKind::Product, new_item(1, "P")).await.unwrap();

  let a = s.add_product_image(product.id, "gallery_a.png".into()).await.unwrap();
  let b = s.add_product_image(product.id, "gallery_b.png".into()).await.unwrap();
  assert_eq!(a.display_order, 1);
  assert_eq!(b.display_order, 2);

  let images = s.list_product_images(product.id).await.unwrap();
  assert_eq!(images.len(), 2);

  assert_eq!(s.delete_product_image(a.id).await.unwrap().map(|i| i.id), Some(a.id));
  assert!(s.delete_product_image(a.id).await.unwrap().is_none());

  s.delete_item(CatalogKind::Product, product.id).await.unwrap();
  assert!(s.list_product_images(product.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn gallery_requires_existing_product() {
  let s = store().await;
  assert!(s.add_product_image(42, "orphan.png".into()).await.is_err());
}

// ─── Admins ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admins_are_found_by_username() {
  let s = store().await;
  assert_eq!(s.count_admins().await.unwrap(), 0);

  let admin = s.create_admin("admin".into(), "$argon2id$fake".into()).await.unwrap();
  assert_eq!(s.count_admins().await.unwrap(), 1);
  assert_eq!(s.find_admin("admin").await.unwrap(), Some(admin));
  assert!(s.find_admin("root").await.unwrap().is_none());
}

#[tokio::test]
async fn admin_usernames_are_unique() {
  let s = store().await;
  s.create_admin("admin".into(), "h1".into()).await.unwrap();
  assert!(s.create_admin("admin".into(), "h2".into()).await.is_err());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

fn session(hash: &str, username: Option<&str>, ttl: Duration) -> Session {
  let now = Utc::now();
  Session {
    token_hash: hash.into(),
    username:   username.map(Into::into),
    csrf_token: format!("csrf-{hash}"),
    created_at: now,
    expires_at: now + ttl,
  }
}

#[tokio::test]
async fn sessions_round_trip_and_delete() {
  let s = store().await;
  let sess = session("h1", Some("admin"), Duration::hours(1));
  s.create_session(sess.clone()).await.unwrap();

  let loaded = s.get_session("h1").await.unwrap().unwrap();
  assert_eq!(loaded.username.as_deref(), Some("admin"));
  assert_eq!(loaded.csrf_token, "csrf-h1");
  assert!(loaded.is_authenticated());

  s.delete_session("h1").await.unwrap();
  assert!(s.get_session("h1").await.unwrap().is_none());
}

#[tokio::test]
async fn purge_drops_only_expired_sessions() {
  let s = store().await;
  s.create_session(session("old", None, Duration::seconds(-5))).await.unwrap();
  s.create_session(session("new", None, Duration::hours(1))).await.unwrap();

  assert_eq!(s.purge_expired_sessions(Utc::now()).await.unwrap(), 1);
  assert!(s.get_session("old").await.unwrap().is_none());
  assert!(s.get_session("new").await.unwrap().is_some());
}

#[tokio::test]
async fn touching_a_session_moves_its_expiry() {
  let s = store().await;
  s.create_session(session("h", Some("admin"), Duration::seconds(5))).await.unwrap();

  let later = Utc::now() + Duration::hours(1);
  assert!(s.touch_session("h", later).await.unwrap());
  let loaded = s.get_session("h").await.unwrap().unwrap();
  assert!(loaded.expires_at > Utc::now() + Duration::minutes(59));

  assert!(!s.touch_session("missing", later).await.unwrap());
}

#[tokio::test]
async fn flashes_are_consumed_once() {
  let s = store().await;
  s.create_session(session("h", None, Duration::hours(1))).await.unwrap();

  s.push_flash("h", Flash::danger("Invalid username or password. Please try again."))
    .await
    .unwrap();
  s.push_flash("h", Flash::success("ok")).await.unwrap();

  let flashes = s.take_flashes("h").await.unwrap();
  assert_eq!(flashes.len(), 2);
  assert_eq!(flashes[0].level, FlashLevel::Danger);
  assert_eq!(flashes[1].message, "ok");

  assert!(s.take_flashes("h").await.unwrap().is_empty());
}

#[tokio::test]
async fn flashing_an_unknown_session_is_a_no_op() {
  let s = store().await;
  s.push_flash("missing", Flash::success("lost")).await.unwrap();
  assert!(s.take_flashes("missing").await.unwrap().is_empty());
}
