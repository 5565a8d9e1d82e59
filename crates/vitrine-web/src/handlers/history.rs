use axum::{
  extract::{Path, State},
  response::{Html, Redirect},
};
use vitrine_core::{
  history::{ChangeNote, HISTORY_PAGE_SIZE, MANUAL_BACKUP},
  session::Flash,
  store::SessionStore,
};

use super::{DASHBOARD, HISTORY, flash_redirect};
use crate::{
  AppState,
  error::Error,
  form::FormData,
  pages::{self, AdminChrome},
  session::AdminSession,
};

/// GET /admin/history
pub async fn list<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
) -> Result<Html<String>, Error> {
  let store = &*state.store;
  let entries = store
    .list_history(HISTORY_PAGE_SIZE)
    .await
    .map_err(Error::store)?;
  let flashes = admin.session.take_flashes(store).await?;
  let chrome = AdminChrome {
    username: &admin.username,
    csrf:     admin.session.csrf_token(),
    flashes:  &flashes,
  };
  Ok(Html(pages::history(&chrome, &entries)?))
}

/// POST /admin/history/snapshot
pub async fn snapshot<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  form: FormData,
) -> Result<Redirect, Error> {
  form.verify_csrf(&admin.session)?;
  let description = form.non_empty("description").unwrap_or(MANUAL_BACKUP);
  let entry = state
    .store
    .snapshot(ChangeNote::new(description, admin.username.as_str()))
    .await
    .map_err(Error::store)?;
  tracing::info!(id = entry.id, %description, "manual snapshot");

  flash_redirect(&state, &admin.session, Flash::success("Backup created."), HISTORY).await
}

/// GET /admin/rollback/{id}
pub async fn rollback<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<i64>,
) -> Result<Redirect, Error> {
  let outcome = state
    .store
    .rollback(id, admin.username.clone())
    .await
    .map_err(Error::store)?;
  let Some(outcome) = outcome else {
    return flash_redirect(&state, &admin.session, Flash::danger("History entry not found."), HISTORY)
      .await;
  };
  tracing::info!(
    restored = outcome.restored.id,
    backup = outcome.backup.id,
    username = %admin.username,
    "content rolled back",
  );

  flash_redirect(
    &state,
    &admin.session,
    Flash::success("Content successfully restored to previous version!"),
    DASHBOARD,
  )
  .await
}

/// GET /admin/history/delete/{id}
pub async fn delete<S: SessionStore>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<i64>,
) -> Result<Redirect, Error> {
  let flash = if state.store.delete_history(id).await.map_err(Error::store)? {
    tracing::info!(id, "history entry deleted");
    Flash::success("History entry deleted.")
  } else {
    Flash::danger("History entry not found.")
  };
  flash_redirect(&state, &admin.session, flash, HISTORY).await
}
