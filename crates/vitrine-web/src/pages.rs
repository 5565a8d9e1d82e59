//! Server-rendered pages.
//!
//! Each function renders one complete document with [`Html`]; handlers gather
//! the data and wrap the result in `axum::response::Html`.

use vitrine_core::{
  catalog::{CatalogItem, CatalogKind, ProductImage},
  content::{ContentField, ContentFields, Section},
  history::{HistoryEntry, MANUAL_BACKUP},
  session::Flash,
  upload::ImageSlot,
};

use crate::{error::Error, form::CSRF_FIELD, html::Html, media::MediaStore};

type Result<T> = std::result::Result<T, Error>;

const LOGO_SRC: &str = "/static/images/logo.jpg";

/// Per-request context shared by every admin page.
pub struct AdminChrome<'a> {
  pub username: &'a str,
  pub csrf:     &'a str,
  pub flashes:  &'a [Flash],
}

/// `hero_title` → `Hero title`.
fn field_label(field: ContentField) -> String {
  let spaced = field.as_str().replace('_', " ");
  let mut chars = spaced.chars();
  match chars.next() {
    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    None => spaced,
  }
}

fn flashes(html: &mut Html, flashes: &[Flash]) -> Result<()> {
  for flash in flashes {
    let class = format!("alert alert-{}", flash.level.as_str());
    html.element("div", &[("class", class.as_str()), ("role", "alert")], &flash.message)?;
  }
  Ok(())
}

fn csrf_input(html: &mut Html, csrf: &str) -> Result<()> {
  html.void("input", &[("type", "hidden"), ("name", CSRF_FIELD), ("value", csrf)])?;
  Ok(())
}

fn labelled_input(html: &mut Html, label: &str, name: &str, kind: &str, value: &str) -> Result<()> {
  html.element("label", &[("for", name)], label)?;
  html.void("input", &[("type", kind), ("id", name), ("name", name), ("value", value)])?;
  Ok(())
}

fn labelled_textarea(html: &mut Html, label: &str, name: &str, value: &str) -> Result<()> {
  html.element("label", &[("for", name)], label)?;
  html.element("textarea", &[("id", name), ("name", name), ("rows", "4")], value)?;
  Ok(())
}

fn file_input(html: &mut Html, label: &str, name: &str, multiple: bool) -> Result<()> {
  html.element("label", &[("for", name)], label)?;
  let mut attrs = vec![("type", "file"), ("id", name), ("name", name), ("accept", "image/*")];
  if multiple {
    attrs.push(("multiple", "multiple"));
  }
  html.void("input", &attrs)?;
  Ok(())
}

fn thumbnail(html: &mut Html, src: &str, alt: &str) -> Result<()> {
  html.void("img", &[("class", "thumb"), ("src", src), ("alt", alt)])?;
  Ok(())
}

fn admin_document(title: &str, chrome: &AdminChrome<'_>) -> Result<Html> {
  let mut html = Html::document(&format!("{title} · Admin"))?;
  html.open("header", &[])?;
  html.open("nav", &[])?;
  html.element("a", &[("href", "/admin/dashboard")], "Dashboard")?;
  html.element("a", &[("href", "/admin/history")], "History")?;
  html.element("a", &[("href", "/"), ("target", "_blank")], "View site")?;
  html.element("a", &[("href", "/admin/logout")], "Log out")?;
  html.element("span", &[], &format!("Signed in as {}", chrome.username))?;
  html.close("nav")?;
  html.close("header")?;
  html.open("main", &[])?;
  flashes(&mut html, chrome.flashes)?;
  Ok(html)
}

fn admin_finish(mut html: Html) -> Result<String> {
  html.close("main")?;
  html.finish()
}

// ─── Public page ─────────────────────────────────────────────────────────────

/// A product together with its gallery, for the public page.
pub struct ProductCard {
  pub product: CatalogItem,
  pub gallery: Vec<ProductImage>,
}

fn item_card(html: &mut Html, item: &CatalogItem, media: &MediaStore) -> Result<()> {
  html.open("article", &[("class", "card")])?;
  match (&item.image, &item.icon) {
    (Some(image), _) => thumbnail(html, &media.src(item.kind.image_slot(), image), &item.title)?,
    (None, Some(icon)) => {
      html.element("span", &[("class", "icon")], icon)?;
    }
    (None, None) => {}
  }
  html.element("h3", &[], &item.title)?;
  html.element("p", &[], &item.description)?;
  Ok(())
}

pub fn index(
  content: &ContentFields,
  features: &[CatalogItem],
  products: &[ProductCard],
  media: &MediaStore,
  year: i32,
) -> Result<String> {
  let mut html = Html::document(&content.company_name)?;

  html.open("header", &[])?;
  html.void("img", &[("src", LOGO_SRC), ("alt", content.company_name.as_str()), ("height", "48")])?;
  html.element("strong", &[], &content.company_name)?;
  html.element("span", &[], &content.company_tagline)?;
  html.open("nav", &[])?;
  html.element("a", &[("href", "#features")], "Features")?;
  html.element("a", &[("href", "#products")], "Products")?;
  html.element("a", &[("href", "#contact")], "Contact")?;
  html.close("nav")?;
  html.close("header")?;

  html.open("section", &[("id", "hero")])?;
  html.element("p", &[("class", "label")], &content.hero_label)?;
  html.element("h1", &[], &content.hero_title)?;
  html.element("p", &[], &content.hero_description)?;
  html.open("div", &[("class", "stats")])?;
  for (number, text) in [
    (&content.stat1_number, &content.stat1_text),
    (&content.stat2_number, &content.stat2_text),
  ] {
    html.open("div", &[("class", "stat")])?;
    html.element("strong", &[], number)?;
    html.element("span", &[], text)?;
    html.close("div")?;
  }
  html.close("div")?;
  html.close("section")?;

  html.open("section", &[("id", "features")])?;
  html.element("p", &[("class", "label")], &content.features_label)?;
  html.element("h2", &[], &content.features_title)?;
  html.element("p", &[], &content.features_description)?;
  html.open("div", &[("class", "grid")])?;
  for feature in features {
    item_card(&mut html, feature, media)?;
    html.close("article")?;
  }
  html.close("div")?;
  html.close("section")?;

  html.open("section", &[("id", "products")])?;
  html.element("p", &[("class", "label")], &content.products_label)?;
  html.element("h2", &[], &content.products_title)?;
  html.element("p", &[], &content.products_description)?;
  html.open("div", &[("class", "grid")])?;
  for card in products {
    item_card(&mut html, &card.product, media)?;
    if !card.gallery.is_empty() {
      html.open("div", &[("class", "gallery")])?;
      for image in &card.gallery {
        thumbnail(&mut html, &media.src(ImageSlot::Gallery, &image.image), &card.product.title)?;
      }
      html.close("div")?;
    }
    html.close("article")?;
  }
  html.close("div")?;
  html.close("section")?;

  html.open("section", &[("id", "contact")])?;
  html.element("p", &[("class", "label")], &content.contact_tagline)?;
  html.element("h2", &[], &content.contact_title)?;
  html.element("p", &[], &content.contact_description)?;
  html.open("ul", &[])?;
  let tel = format!("tel:{}", content.contact_phone);
  let mailto = format!("mailto:{}", content.contact_email);
  html.open("li", &[])?.element("a", &[("href", tel.as_str())], &content.contact_phone)?.close("li")?;
  html.open("li", &[])?.element("a", &[("href", mailto.as_str())], &content.contact_email)?.close("li")?;
  html.element("li", &[], &content.contact_address)?;
  html.close("ul")?;
  html.open("form", &[("method", "post"), ("action", "/contact")])?;
  labelled_input(&mut html, "Name", "name", "text", "")?;
  labelled_input(&mut html, "Email", "email", "email", "")?;
  labelled_input(&mut html, "Phone", "phone", "text", "")?;
  labelled_input(&mut html, "Subject", "subject", "text", "")?;
  labelled_textarea(&mut html, "Message", "message", "")?;
  html.element("button", &[("type", "submit")], "Send message")?;
  html.close("form")?;
  html.close("section")?;

  html.open("footer", &[])?;
  html.element("p", &[], &content.footer_text)?;
  html.element("p", &[], &format!("© {year} {}", content.company_name))?;
  html.close("footer")?;

  html.finish()
}

// ─── Login ───────────────────────────────────────────────────────────────────

pub fn login(flash_list: &[Flash], csrf: &str) -> Result<String> {
  let mut html = Html::document("Admin login")?;
  html.open("main", &[])?;
  html.element("h1", &[], "Admin login")?;
  flashes(&mut html, flash_list)?;
  html.open("form", &[("method", "post"), ("action", "/admin/login")])?;
  csrf_input(&mut html, csrf)?;
  labelled_input(&mut html, "Username", "username", "text", "")?;
  labelled_input(&mut html, "Password", "password", "password", "")?;
  html.element("button", &[("type", "submit")], "Log in")?;
  html.close("form")?;
  html.close("main")?;
  html.finish()
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

pub struct Dashboard<'a> {
  pub content:  &'a ContentFields,
  pub features: &'a [CatalogItem],
  pub products: &'a [CatalogItem],
}

fn section_form(html: &mut Html, section: Section, content: &ContentFields, csrf: &str) -> Result<()> {
  let action = format!("/admin/update/{section}");
  html.open("section", &[("class", "card"), ("id", section.as_str())])?;
  html.element("h2", &[], section.title())?;

  if section == Section::General {
    html.open("form", &[
      ("method", "post"),
      ("action", action.as_str()),
      ("enctype", "multipart/form-data"),
    ])?;
  } else {
    html.open("form", &[("method", "post"), ("action", action.as_str())])?;
  }
  csrf_input(html, csrf)?;
  for field in section.fields() {
    let label = field_label(field);
    if field.is_long() {
      labelled_textarea(html, &label, field.as_str(), content.get(field))?;
    } else {
      labelled_input(html, &label, field.as_str(), "text", content.get(field))?;
    }
  }
  if section == Section::General {
    thumbnail(html, LOGO_SRC, "Current logo")?;
    file_input(html, "Logo", "logo", false)?;
  }
  html.element("button", &[("type", "submit")], &format!("Save {}", section.title().to_lowercase()))?;
  html.close("form")?;
  html.close("section")?;
  Ok(())
}

fn item_table(
  html: &mut Html,
  kind: CatalogKind,
  items: &[CatalogItem],
  media: &MediaStore,
  csrf: &str,
) -> Result<()> {
  html.open("section", &[("class", "card"), ("id", kind.slug())])?;
  html.element("h2", &[], &format!("{}s ({})", kind.label(), items.len()))?;

  html.open("table", &[])?;
  html.open("tr", &[])?;
  for heading in ["Order", "Image", "Title", ""] {
    html.element("th", &[], heading)?;
  }
  html.close("tr")?;
  for item in items {
    let edit = format!("/admin/{}/edit/{}", kind.slug(), item.id);
    let delete = format!("/admin/{}/delete/{}", kind.slug(), item.id);
    html.open("tr", &[])?;
    html.element("td", &[], &item.display_order.to_string())?;
    html.open("td", &[])?;
    match (&item.image, &item.icon) {
      (Some(image), _) => thumbnail(html, &media.src(kind.image_slot(), image), &item.title)?,
      (None, Some(icon)) => {
        html.text(icon)?;
      }
      (None, None) => {}
    }
    html.close("td")?;
    html.element("td", &[], &item.title)?;
    html.open("td", &[])?;
    html.element("a", &[("href", edit.as_str())], "Edit")?;
    html.text(" ")?;
    html.element("a", &[("href", delete.as_str())], "Delete")?;
    html.close("td")?;
    html.close("tr")?;
  }
  html.close("table")?;

  let action = format!("/admin/{}/add", kind.slug());
  html.element("h3", &[], &format!("Add {}", kind.label().to_lowercase()))?;
  html.open("form", &[
    ("method", "post"),
    ("action", action.as_str()),
    ("enctype", "multipart/form-data"),
  ])?;
  csrf_input(html, csrf)?;
  labelled_input(html, "Title", "title", "text", "")?;
  labelled_textarea(html, "Description", "description", "")?;
  labelled_input(html, "Order", "order", "number", "0")?;
  if kind == CatalogKind::Feature {
    labelled_input(html, "Icon", "icon", "text", "")?;
  }
  file_input(html, "Image", kind.image_field(), false)?;
  html.element("button", &[("type", "submit")], &format!("Add {}", kind.label().to_lowercase()))?;
  html.close("form")?;
  html.close("section")?;
  Ok(())
}

pub fn dashboard(chrome: &AdminChrome<'_>, view: &Dashboard<'_>, media: &MediaStore) -> Result<String> {
  let mut html = admin_document("Dashboard", chrome)?;
  html.element("h1", &[], "Dashboard")?;
  html.element(
    "p",
    &[],
    &format!("{} features · {} products", view.features.len(), view.products.len()),
  )?;

  for section in Section::ALL {
    section_form(&mut html, *section, view.content, chrome.csrf)?;
  }
  item_table(&mut html, CatalogKind::Feature, view.features, media, chrome.csrf)?;
  item_table(&mut html, CatalogKind::Product, view.products, media, chrome.csrf)?;

  admin_finish(html)
}

// ─── Item editor ─────────────────────────────────────────────────────────────

pub fn edit_item(
  chrome: &AdminChrome<'_>,
  item: &CatalogItem,
  gallery: &[ProductImage],
  media: &MediaStore,
) -> Result<String> {
  let kind = item.kind;
  let mut html = admin_document(&format!("Edit {}", kind.label().to_lowercase()), chrome)?;
  html.element("h1", &[], &format!("Edit {}: {}", kind.label().to_lowercase(), item.title))?;

  let action = format!("/admin/{}/edit/{}", kind.slug(), item.id);
  html.open("form", &[
    ("method", "post"),
    ("action", action.as_str()),
    ("enctype", "multipart/form-data"),
    ("class", "card"),
  ])?;
  csrf_input(&mut html, chrome.csrf)?;
  labelled_input(&mut html, "Title", "title", "text", &item.title)?;
  labelled_textarea(&mut html, "Description", "description", &item.description)?;
  labelled_input(&mut html, "Order", "order", "number", &item.display_order.to_string())?;
  if kind == CatalogKind::Feature {
    labelled_input(&mut html, "Icon", "icon", "text", item.icon.as_deref().unwrap_or_default())?;
  }
  if let Some(image) = &item.image {
    thumbnail(&mut html, &media.src(kind.image_slot(), image), "Current image")?;
  }
  file_input(&mut html, "Replace image", kind.image_field(), false)?;
  html.element("button", &[("type", "submit")], "Save")?;
  html.close("form")?;

  if kind == CatalogKind::Product {
    html.open("section", &[("class", "card"), ("id", "gallery")])?;
    html.element("h2", &[], &format!("Gallery ({})", gallery.len()))?;
    html.open("div", &[("class", "grid")])?;
    for image in gallery {
      let delete = format!("/admin/product/gallery/delete/{}", image.id);
      html.open("figure", &[])?;
      thumbnail(&mut html, &media.src(ImageSlot::Gallery, &image.image), &item.title)?;
      html.element("a", &[("href", delete.as_str())], "Remove")?;
      html.close("figure")?;
    }
    html.close("div")?;

    let upload = format!("/admin/product/{}/gallery", item.id);
    html.open("form", &[
      ("method", "post"),
      ("action", upload.as_str()),
      ("enctype", "multipart/form-data"),
    ])?;
    csrf_input(&mut html, chrome.csrf)?;
    file_input(&mut html, "Add images", "gallery_images", true)?;
    html.element("button", &[("type", "submit")], "Upload")?;
    html.close("form")?;
    html.close("section")?;
  }

  html.element("a", &[("href", "/admin/dashboard")], "Back to dashboard")?;
  admin_finish(html)
}

// ─── History ─────────────────────────────────────────────────────────────────

pub fn history(chrome: &AdminChrome<'_>, entries: &[HistoryEntry]) -> Result<String> {
  let mut html = admin_document("Content history", chrome)?;
  html.element("h1", &[], "Content history")?;

  html.open("form", &[
    ("method", "post"),
    ("action", "/admin/history/snapshot"),
    ("class", "card"),
  ])?;
  csrf_input(&mut html, chrome.csrf)?;
  html.element("label", &[("for", "description")], "Backup description")?;
  html.void("input", &[
    ("type", "text"),
    ("id", "description"),
    ("name", "description"),
    ("placeholder", MANUAL_BACKUP),
  ])?;
  html.element("button", &[("type", "submit")], "Create backup")?;
  html.close("form")?;

  if entries.is_empty() {
    html.element("p", &[], "No history yet. A snapshot is taken before every content change.")?;
    return admin_finish(html);
  }

  html.open("table", &[])?;
  html.open("tr", &[])?;
  for heading in ["Saved", "Description", "By", "Fields", ""] {
    html.element("th", &[], heading)?;
  }
  html.close("tr")?;
  for entry in entries {
    let restore = format!("/admin/rollback/{}", entry.id);
    let delete = format!("/admin/history/delete/{}", entry.id);
    html.open("tr", &[])?;
    html.element("td", &[], &entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string())?;
    html.element("td", &[], &entry.description)?;
    html.element("td", &[], &entry.created_by)?;
    html.element("td", &[], &entry.snapshot.len().to_string())?;
    html.open("td", &[])?;
    html.element("a", &[("href", restore.as_str())], "Restore")?;
    html.text(" ")?;
    html.element("a", &[("href", delete.as_str())], "Delete")?;
    html.close("td")?;
    html.close("tr")?;
  }
  html.close("table")?;

  admin_finish(html)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use vitrine_core::{history::Snapshot, seed};

  use super::*;

  fn chrome<'a>(flashes: &'a [Flash]) -> AdminChrome<'a> {
    AdminChrome { username: "admin", csrf: "tok", flashes }
  }

  #[test]
  fn labels_are_humanised() {
    assert_eq!(field_label(ContentField::HeroTitle), "Hero title");
    assert_eq!(field_label(ContentField::Stat1Number), "Stat1 number");
  }

  #[test]
  fn dashboard_has_a_form_per_section() {
    let content = seed::default_content();
    let media = MediaStore::new("static", None);
    let page = dashboard(
      &chrome(&[Flash::success("Saved!")]),
      &Dashboard { content: &content, features: &[], products: &[] },
      &media,
    )
    .unwrap();

    for section in Section::ALL {
      assert!(page.contains(&format!("action=\"/admin/update/{section}\"")), "{section}");
    }
    assert!(page.contains("alert alert-success"));
    assert!(page.contains("name=\"csrf_token\" value=\"tok\""));
    assert!(page.contains("name=\"feature_image\""));
    assert!(page.contains("name=\"product_image\""));
  }

  #[test]
  fn history_lists_entries_with_restore_links() {
    let entry = HistoryEntry {
      id:          7,
      snapshot:    Snapshot::capture(&seed::default_content()),
      description: "Before hero section update".into(),
      created_by:  "admin".into(),
      created_at:  Utc::now(),
    };
    let page = history(&chrome(&[]), &[entry]).unwrap();
    assert!(page.contains("href=\"/admin/rollback/7\""));
    assert!(page.contains("href=\"/admin/history/delete/7\""));
    assert!(page.contains("Before hero section update"));
  }

  #[test]
  fn product_editor_shows_gallery() {
    let product = CatalogItem {
      id:            3,
      kind:          CatalogKind::Product,
      display_order: 1,
      title:         "Laser".into(),
      description:   "Bright".into(),
      icon:          None,
      image:         Some("https://res.cloudinary.com/d/image/upload/p.png".into()),
    };
    let gallery = [ProductImage {
      id:            11,
      product_id:    3,
      image:         "gallery_x.png".into(),
      display_order: 1,
      created_at:    Utc::now(),
    }];
    let media = MediaStore::new("static", None);
    let page = edit_item(&chrome(&[]), &product, &gallery, &media).unwrap();

    assert!(page.contains("src=\"https://res.cloudinary.com/d/image/upload/p.png\""));
    assert!(page.contains("src=\"/static/images/gallery/gallery_x.png\""));
    assert!(page.contains("href=\"/admin/product/gallery/delete/11\""));
    assert!(page.contains("action=\"/admin/product/3/gallery\""));
  }
}
