use axum::{
  Form,
  extract::State,
  response::{Html, Redirect},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use vitrine_core::{catalog::CatalogKind, seed, store::SiteStore};

use crate::{
  AppState,
  error::Error,
  pages::{self, ProductCard},
};

/// GET /
pub async fn index<S: SiteStore>(State(state): State<AppState<S>>) -> Result<Html<String>, Error> {
  let store = &*state.store;
  let content = store
    .ensure_content(seed::default_content())
    .await
    .map_err(Error::store)?;
  let features = store.list_items(CatalogKind::Feature).await.map_err(Error::store)?;

  let mut products = Vec::new();
  for product in store.list_items(CatalogKind::Product).await.map_err(Error::store)? {
    let gallery = store
      .list_product_images(product.id)
      .await
      .map_err(Error::store)?;
    products.push(ProductCard { product, gallery });
  }

  let page = pages::index(
    &content.fields,
    &features,
    &products,
    &state.media,
    Utc::now().year(),
  )?;
  Ok(Html(page))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
  pub name:    String,
  pub email:   String,
  pub phone:   String,
  pub subject: String,
  pub message: String,
}

/// POST /contact
///
/// Submissions are acknowledged and dropped. Nothing identifying the sender
/// is stored, mailed or logged.
pub async fn contact(Form(form): Form<ContactForm>) -> Redirect {
  tracing::info!(
    subject = %form.subject,
    message_len = form.message.len(),
    "contact form submitted",
  );
  Redirect::to("/#contact")
}

#[cfg(test)]
mod tests {
  use std::{
    io,
    sync::{Arc, Mutex},
  };

  use super::*;

  #[derive(Clone, Default)]
  struct Captured(Arc<Mutex<Vec<u8>>>);

  impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
  }

  #[tokio::test]
  async fn contact_log_omits_sender_details() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
      .with_writer(move || writer.clone())
      .with_ansi(false)
      .with_max_level(tracing::Level::TRACE)
      .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let form = ContactForm {
      name:    "Ada Lovelace".into(),
      email:   "ada@example.com".into(),
      phone:   "+44 20 7946 0000".into(),
      subject: "Quote".into(),
      message: "Hello there".into(),
    };
    let redirect = contact(Form(form)).await;
    assert_eq!(
      axum::response::IntoResponse::into_response(redirect).headers()["location"],
      "/#contact"
    );

    let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(log.contains("contact form submitted"), "{log}");
    assert!(log.contains("Quote"));
    assert!(log.contains("message_len=11"));
    for private in ["Ada Lovelace", "ada@example.com", "7946"] {
      assert!(!log.contains(private), "{private} leaked: {log}");
    }
  }
}
