use axum::{
  extract::{Path, State},
  response::Redirect,
};
use vitrine_core::{
  catalog::CatalogKind,
  session::Flash,
  store::SessionStore,
  upload::{INVALID_IMAGE_MESSAGE, ImageSlot, is_allowed_image},
};

use super::{DASHBOARD, edit_url, flash_redirect};
use crate::{AppState, error::Error, form::FormData, session::AdminSession};

const UPLOAD_FIELD: &str = "gallery_images";

/// POST /admin/product/{id}/gallery
///
/// Every allowed file is appended to the gallery; disallowed ones are skipped.
pub async fn upload<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(product_id): Path<i64>,
  form: FormData,
) -> Result<Redirect, Error> {
  form.verify_csrf(&admin.session)?;
  state
    .store
    .get_item(CatalogKind::Product, product_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound)?;

  let (mut added, mut rejected) = (0usize, 0usize);
  for upload in form.uploads(UPLOAD_FIELD) {
    if !is_allowed_image(&upload.file_name) {
      rejected += 1;
      continue;
    }
    let Some(image) = state.media.store(ImageSlot::Gallery, upload).await else {
      continue;
    };
    state
      .store
      .add_product_image(product_id, image)
      .await
      .map_err(Error::store)?;
    added += 1;
  }
  tracing::info!(product_id, added, rejected, "gallery upload");

  if rejected > 0 {
    admin
      .session
      .flash(&*state.store, Flash::danger(INVALID_IMAGE_MESSAGE))
      .await?;
  }
  let flash = match added {
    0 => Flash::danger("No images were added to the gallery."),
    1 => Flash::success("1 image added to the gallery."),
    n => Flash::success(format!("{n} images added to the gallery.")),
  };
  flash_redirect(&state, &admin.session, flash, &edit_url(CatalogKind::Product, product_id)).await
}

/// GET /admin/product/gallery/delete/{image_id}
pub async fn delete<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(image_id): Path<i64>,
) -> Result<Redirect, Error> {
  let removed = state
    .store
    .delete_product_image(image_id)
    .await
    .map_err(Error::store)?;
  let Some(image) = removed else {
    return Ok(Redirect::to(DASHBOARD));
  };
  state.media.remove(ImageSlot::Gallery, &image.image).await;
  tracing::info!(image_id, product_id = image.product_id, "gallery image deleted");

  flash_redirect(
    &state,
    &admin.session,
    Flash::success("Gallery image deleted."),
    &edit_url(CatalogKind::Product, image.product_id),
  )
  .await
}
