//! Axum route handlers, one module per admin area plus the public page.

pub mod gallery;
pub mod history;
pub mod items;
pub mod login;
pub mod public;
pub mod sections;

use axum::response::Redirect;
use vitrine_core::{catalog::CatalogKind, session::Flash, store::SessionStore};

use crate::{AppState, error::Error, session::ActiveSession};

pub(crate) const ADMIN_HOME: &str = "/admin";
pub(crate) const DASHBOARD: &str = "/admin/dashboard";
pub(crate) const HISTORY: &str = "/admin/history";

/// Queue `flash` on the session and redirect (303) to `to`.
pub(crate) async fn flash_redirect<S: SessionStore>(
  state: &AppState<S>,
  session: &ActiveSession,
  flash: Flash,
  to: &str,
) -> Result<Redirect, Error> {
  session.flash(&*state.store, flash).await?;
  Ok(Redirect::to(to))
}

pub(crate) fn edit_url(kind: CatalogKind, id: i64) -> String {
  format!("/admin/{}/edit/{id}", kind.slug())
}
