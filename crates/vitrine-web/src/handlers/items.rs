//! Add, edit and delete for the feature and product lists.
//!
//! Both lists share these handlers; the router layers the list's
//! [`CatalogKind`] onto each route as an extension.

use axum::{
  Extension,
  extract::{Path, State},
  response::{Html, Redirect},
};
use vitrine_core::{
  catalog::{CatalogKind, NewCatalogItem, parse_order},
  session::Flash,
  store::SessionStore,
  upload::{ImageSlot, INVALID_IMAGE_MESSAGE, is_allowed_image},
};

use super::{DASHBOARD, edit_url, flash_redirect};
use crate::{
  AppState,
  error::Error,
  form::{FormData, Upload},
  pages::{self, AdminChrome},
  session::AdminSession,
};

/// The chosen image upload, split into a valid one and a rejected one.
fn image_upload<'a>(form: &'a FormData, kind: CatalogKind) -> Result<Option<&'a Upload>, &'a Upload> {
  match form.upload(kind.image_field()) {
    Some(upload) if !is_allowed_image(&upload.file_name) => Err(upload),
    other => Ok(other),
  }
}

/// POST /admin/{kind}/add
pub async fn add<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Extension(kind): Extension<CatalogKind>,
  form: FormData,
) -> Result<Redirect, Error> {
  form.verify_csrf(&admin.session)?;

  let upload = match image_upload(&form, kind) {
    Ok(upload) => upload,
    Err(rejected) => {
      tracing::info!(file = %rejected.file_name, %kind, "rejected item image");
      return flash_redirect(&state, &admin.session, Flash::danger(INVALID_IMAGE_MESSAGE), DASHBOARD)
        .await;
    }
  };
  let image = match upload {
    Some(upload) => state.media.store(kind.image_slot(), upload).await,
    None => None,
  };

  let item = NewCatalogItem {
    display_order: parse_order(form.get("order")),
    title:         form.get("title").unwrap_or_default().trim().to_owned(),
    description:   form.get("description").unwrap_or_default().trim().to_owned(),
    icon:          form.non_empty("icon").map(str::to_owned),
    image,
  };
  let item = state.store.add_item(kind, item).await.map_err(Error::store)?;
  tracing::info!(%kind, id = item.id, "item added");

  flash_redirect(
    &state,
    &admin.session,
    Flash::success(format!("{} added successfully!", kind.label())),
    DASHBOARD,
  )
  .await
}

/// GET /admin/{kind}/edit/{id}
pub async fn edit_page<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Extension(kind): Extension<CatalogKind>,
  Path(id): Path<i64>,
) -> Result<Html<String>, Error> {
  let store = &*state.store;
  let item = store
    .get_item(kind, id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;
  let gallery = match kind {
    CatalogKind::Product => store.list_product_images(id).await.map_err(Error::store)?,
    CatalogKind::Feature => Vec::new(),
  };

  let flashes = admin.session.take_flashes(store).await?;
  let chrome = AdminChrome {
    username: &admin.username,
    csrf:     admin.session.csrf_token(),
    flashes:  &flashes,
  };
  Ok(Html(pages::edit_item(&chrome, &item, &gallery, &state.media)?))
}

/// POST /admin/{kind}/edit/{id}
///
/// Fields absent from the form keep their stored values. When a new image is
/// uploaded the old one is deleted first; if storing the new one then fails
/// the item is left without an image.
pub async fn update<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Extension(kind): Extension<CatalogKind>,
  Path(id): Path<i64>,
  form: FormData,
) -> Result<Redirect, Error> {
  form.verify_csrf(&admin.session)?;
  let mut item = state
    .store
    .get_item(kind, id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let upload = match image_upload(&form, kind) {
    Ok(upload) => upload,
    Err(rejected) => {
      tracing::info!(file = %rejected.file_name, %kind, id, "rejected item image");
      return flash_redirect(
        &state,
        &admin.session,
        Flash::danger(INVALID_IMAGE_MESSAGE),
        &edit_url(kind, id),
      )
      .await;
    }
  };

  if let Some(title) = form.get("title") {
    item.title = title.trim().to_owned();
  }
  if let Some(description) = form.get("description") {
    item.description = description.trim().to_owned();
  }
  if form.get("order").is_some() {
    item.display_order = parse_order(form.get("order"));
  }
  if form.get("icon").is_some() {
    item.icon = form.non_empty("icon").map(str::to_owned);
  }
  if let Some(upload) = upload {
    if let Some(old) = item.image.take() {
      state.media.remove(kind.image_slot(), &old).await;
    }
    item.image = state.media.store(kind.image_slot(), upload).await;
  }

  if !state.store.save_item(item).await.map_err(Error::store)? {
    return Err(Error::NotFound);
  }
  tracing::info!(%kind, id, "item updated");

  flash_redirect(
    &state,
    &admin.session,
    Flash::success(format!("{} updated successfully!", kind.label())),
    DASHBOARD,
  )
  .await
}

/// GET /admin/{kind}/delete/{id}
///
/// Deleting an item that no longer exists is not an error.
pub async fn delete<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Extension(kind): Extension<CatalogKind>,
  Path(id): Path<i64>,
) -> Result<Redirect, Error> {
  let store = &*state.store;
  let gallery = match kind {
    CatalogKind::Product => store.list_product_images(id).await.map_err(Error::store)?,
    CatalogKind::Feature => Vec::new(),
  };

  let Some(item) = store.delete_item(kind, id).await.map_err(Error::store)? else {
    return Ok(Redirect::to(DASHBOARD));
  };
  if let Some(image) = &item.image {
    state.media.remove(kind.image_slot(), image).await;
  }
  for image in &gallery {
    state.media.remove(ImageSlot::Gallery, &image.image).await;
  }
  tracing::info!(%kind, id, gallery = gallery.len(), "item deleted");

  flash_redirect(
    &state,
    &admin.session,
    Flash::success(format!("{} deleted successfully!", kind.label())),
    DASHBOARD,
  )
  .await
}
