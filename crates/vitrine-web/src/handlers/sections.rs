use axum::{
  extract::{Path, State},
  response::{Html, Redirect},
};
use vitrine_core::{
  catalog::CatalogKind,
  content::{ContentPatch, Section},
  history::ChangeNote,
  seed,
  session::Flash,
  store::SessionStore,
  upload::{INVALID_LOGO_MESSAGE, is_allowed_image},
};

use super::{DASHBOARD, flash_redirect};
use crate::{
  AppState,
  error::Error,
  form::FormData,
  pages::{self, AdminChrome, Dashboard},
  session::AdminSession,
};

/// Render the dashboard for `admin`, consuming their pending flashes.
pub(crate) async fn render_dashboard<S: SessionStore>(
  state: &AppState<S>,
  admin: &AdminSession,
) -> Result<Html<String>, Error> {
  let store = &*state.store;
  let flashes = admin.session.take_flashes(store).await?;
  let content = store
    .ensure_content(seed::default_content())
    .await
    .map_err(Error::store)?;
  let features = store.list_items(CatalogKind::Feature).await.map_err(Error::store)?;
  let products = store.list_items(CatalogKind::Product).await.map_err(Error::store)?;

  let chrome = AdminChrome {
    username: &admin.username,
    csrf:     admin.session.csrf_token(),
    flashes:  &flashes,
  };
  let view = Dashboard { content: &content.fields, features: &features, products: &products };
  Ok(Html(pages::dashboard(&chrome, &view, &state.media)?))
}

/// GET /admin/dashboard
pub async fn dashboard<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Html<String>, Error> {
  render_dashboard(&state, &admin).await
}

/// POST /admin/update/{section}
///
/// Fields of the section missing from the form are left as they are.
pub async fn update<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(section): Path<String>,
  form: FormData,
) -> Result<Redirect, Error> {
  let section: Section = section.parse().map_err(|_| Error::NotFound)?;
  form.verify_csrf(&admin.session)?;

  let logo = match section {
    Section::General => form.upload("logo"),
    _ => None,
  };
  if let Some(logo) = logo
    && !is_allowed_image(&logo.file_name)
  {
    tracing::info!(file = %logo.file_name, "rejected logo upload");
    return flash_redirect(&state, &admin.session, Flash::danger(INVALID_LOGO_MESSAGE), DASHBOARD)
      .await;
  }

  let mut patch = ContentPatch::new();
  for field in section.fields() {
    if let Some(value) = form.get(field.as_str()) {
      patch.set(field, value);
    }
  }
  state
    .store
    .update_content(patch, ChangeNote::new(section.snapshot_reason(), admin.username.as_str()))
    .await
    .map_err(Error::store)?;
  tracing::info!(%section, username = %admin.username, "content section updated");

  if let Some(logo) = logo {
    if state.media.store_logo(logo).await {
      admin
        .session
        .flash(&*state.store, Flash::success("Logo updated successfully!"))
        .await?;
    } else {
      admin
        .session
        .flash(&*state.store, Flash::danger("The logo could not be saved."))
        .await?;
    }
  }

  flash_redirect(&state, &admin.session, Flash::success(section.success_message()), DASHBOARD)
    .await
}
