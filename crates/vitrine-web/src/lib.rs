//! HTTP layer for Vitrine.
//!
//! Exposes an axum [`Router`] serving the public marketing page and the
//! session-protected admin editor, backed by any [`SessionStore`].

pub mod auth;
pub mod error;
pub mod form;
pub mod handlers;
pub mod html;
pub mod media;
pub mod pages;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Extension, Router,
  extract::DefaultBodyLimit,
  http::{HeaderName, HeaderValue, header},
  middleware,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::{
  services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use vitrine_core::{
  catalog::CatalogKind,
  seed,
  store::{SessionStore, SiteStore},
};

use handlers::{gallery, history, items, login, public, sections};
use media::MediaStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Every key has a default.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  /// `sqlite://relative.db`, `sqlite:///absolute.db`, a plain path or
  /// `:memory:`.
  pub database_url:          String,
  /// Keys session token hashes; random per boot when unset.
  pub secret_key:            Option<String>,
  /// Credentials of the admin created on first boot.
  pub admin_username:        String,
  pub admin_password:        String,
  /// Request body limit in bytes.
  pub max_content_length:    usize,
  pub session_cookie_secure: bool,
  pub session_lifetime_secs: u64,
  pub static_dir:            PathBuf,
  pub environment:           String,
  pub cloudinary_cloud_name: Option<String>,
  pub cloudinary_api_key:    Option<String>,
  pub cloudinary_api_secret: Option<String>,
  pub cloudinary_folder:     String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "0.0.0.0".to_string(),
      port:                  5000,
      database_url:          "sqlite://cms.db".to_string(),
      secret_key:            None,
      admin_username:        "admin".to_string(),
      admin_password:        "admin123".to_string(),
      max_content_length:    5 * 1024 * 1024,
      session_cookie_secure: false,
      session_lifetime_secs: 3600,
      static_dir:            PathBuf::from("static"),
      environment:           "development".to_string(),
      cloudinary_cloud_name: None,
      cloudinary_api_key:    None,
      cloudinary_api_secret: None,
      cloudinary_folder:     "vitrine".to_string(),
    }
  }
}

impl ServerConfig {
  pub fn is_production(&self) -> bool { self.environment.eq_ignore_ascii_case("production") }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:          Arc<S>,
  pub config:         Arc<ServerConfig>,
  pub media:          Arc<MediaStore>,
  pub session_secret: Arc<str>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:          Arc::clone(&self.store),
      config:         Arc::clone(&self.config),
      media:          Arc::clone(&self.media),
      session_secret: Arc::clone(&self.session_secret),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Result<Self, Error> {
    let secret = match config.secret_key.as_deref().map(str::trim) {
      Some(key) if !key.is_empty() => key.to_owned(),
      _ => {
        tracing::warn!("no secret_key configured; sessions will not survive a restart");
        session::new_secret()
      }
    };
    let media = MediaStore::from_config(&config)?;
    Ok(Self {
      store:          Arc::new(store),
      config:         Arc::new(config),
      media:          Arc::new(media),
      session_secret: secret.into(),
    })
  }
}

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// First-boot setup: the default admin, the Content row, and the seed
/// feature and product lists. Each step only runs when its table is empty.
pub async fn bootstrap<S: SiteStore>(store: &S, config: &ServerConfig) -> Result<(), Error> {
  if store.count_admins().await.map_err(Error::store)? == 0 {
    let hash = auth::hash_password(&config.admin_password)?;
    store
      .create_admin(config.admin_username.clone(), hash)
      .await
      .map_err(Error::store)?;
    tracing::info!(username = %config.admin_username, "created default admin");
  }

  store
    .ensure_content(seed::default_content())
    .await
    .map_err(Error::store)?;

  for (kind, defaults) in [
    (CatalogKind::Feature, seed::default_features()),
    (CatalogKind::Product, seed::default_products()),
  ] {
    if store.count_items(kind).await.map_err(Error::store)? > 0 {
      continue;
    }
    let count = defaults.len();
    for item in defaults {
      store.add_item(kind, item).await.map_err(Error::store)?;
    }
    tracing::info!(kind = %kind, count, "seeded default items");
  }
  Ok(())
}

// ─── Router ───────────────────────────────────────────────────────────────────

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
  script-src 'self' 'unsafe-inline'; \
  style-src 'self' 'unsafe-inline' https://fonts.googleapis.com; \
  font-src 'self' https://fonts.gstatic.com; \
  img-src 'self' data: https://res.cloudinary.com; \
  frame-src https://www.google.com https://maps.google.com";

const SECURITY_HEADERS: &[(HeaderName, &str)] = &[
  (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
  (header::X_FRAME_OPTIONS, "DENY"),
  (header::X_XSS_PROTECTION, "1; mode=block"),
  (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
  (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
];

/// Add, edit and delete routes for one catalog list.
fn catalog_routes<S: SessionStore + 'static>(kind: CatalogKind) -> Router<AppState<S>> {
  let base = format!("/admin/{}", kind.slug());
  Router::new()
    .route(&format!("{base}/add"), post(items::add::<S>))
    .route(
      &format!("{base}/edit/{{id}}"),
      get(items::edit_page::<S>).post(items::update::<S>),
    )
    .route(&format!("{base}/delete/{{id}}"), get(items::delete::<S>))
    .layer(Extension(kind))
}

/// Build the full application [`Router`].
pub fn router<S: SessionStore + 'static>(state: AppState<S>) -> Router {
  let admin = Router::new()
    .route("/admin", get(login::home::<S>))
    .route("/admin/login", post(login::login::<S>))
    .route("/admin/logout", get(login::logout::<S>))
    .route("/admin/dashboard", get(sections::dashboard::<S>))
    .route("/admin/update/{section}", post(sections::update::<S>))
    .merge(catalog_routes::<S>(CatalogKind::Feature))
    .merge(catalog_routes::<S>(CatalogKind::Product))
    .route("/admin/product/{id}/gallery", post(gallery::upload::<S>))
    .route("/admin/product/gallery/delete/{image_id}", get(gallery::delete::<S>))
    .route("/admin/history", get(history::list::<S>))
    .route("/admin/history/snapshot", post(history::snapshot::<S>))
    .route("/admin/history/delete/{id}", get(history::delete::<S>))
    .route("/admin/rollback/{id}", get(history::rollback::<S>))
    .route_layer(middleware::from_fn_with_state(state.clone(), session::layer::<S>));

  let mut app = Router::new()
    .route("/", get(public::index::<S>))
    .route("/contact", post(public::contact))
    .merge(admin)
    .nest_service("/static", ServeDir::new(&state.config.static_dir))
    .layer(DefaultBodyLimit::max(state.config.max_content_length))
    .with_state(state);

  for (name, value) in SECURITY_HEADERS {
    app = app.layer(SetResponseHeaderLayer::overriding(
      name.clone(),
      HeaderValue::from_static(*value),
    ));
  }
  app.layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
