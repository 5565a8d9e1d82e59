use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
};
use vitrine_core::{session::Flash, store::SessionStore};

use super::{ADMIN_HOME, DASHBOARD, flash_redirect, sections};
use crate::{
  AppState, auth,
  error::Error,
  form::FormData,
  pages,
  session::{self, AdminSession, Visitor},
};

const LOGIN_FAILED: &str = "Invalid username or password. Please try again.";

/// GET /admin
///
/// Logged-in admins get the dashboard directly; everyone else the login form.
pub async fn home<S: SessionStore>(
  State(state): State<AppState<S>>,
  Visitor(active): Visitor,
) -> Result<Html<String>, Error> {
  if let Some(username) = active.username().map(str::to_owned) {
    return sections::render_dashboard(&state, &AdminSession { session: active, username }).await;
  }
  let flashes = active.take_flashes(&*state.store).await?;
  Ok(Html(pages::login(&flashes, active.csrf_token())?))
}

/// POST /admin/login
pub async fn login<S: SessionStore>(
  State(state): State<AppState<S>>,
  Visitor(active): Visitor,
  form: FormData,
) -> Result<Response, Error> {
  form.verify_csrf(&active)?;
  let username = form.get("username").unwrap_or_default().trim();
  let password = form.get("password").unwrap_or_default();

  let admin = state
    .store
    .find_admin(username)
    .await
    .map_err(Error::store)?;
  let Some(admin) = admin.filter(|a| auth::verify_password(password, &a.password_hash)) else {
    tracing::info!(%username, "failed admin login");
    let redirect = flash_redirect(&state, &active, Flash::danger(LOGIN_FAILED), ADMIN_HOME).await?;
    return Ok(redirect.into_response());
  };

  // A fresh token on privilege change; the anonymous one stops working.
  state
    .store
    .delete_session(&active.session.token_hash)
    .await
    .map_err(Error::store)?;
  let rotated = session::start(&state, Some(admin.username.clone())).await?;
  rotated
    .flash(&*state.store, Flash::success("Login successful!"))
    .await?;
  tracing::info!(username = %admin.username, "admin logged in");

  let mut response = Redirect::to(DASHBOARD).into_response();
  session::set_cookie(&mut response, &rotated.cookie(&state));
  Ok(response)
}

/// GET /admin/logout
pub async fn logout<S: SessionStore>(
  State(state): State<AppState<S>>,
  Visitor(active): Visitor,
) -> Result<Response, Error> {
  state
    .store
    .delete_session(&active.session.token_hash)
    .await
    .map_err(Error::store)?;
  if let Some(username) = active.username() {
    tracing::info!(%username, "admin logged out");
  }

  let mut response = Redirect::to(ADMIN_HOME).into_response();
  session::set_cookie(
    &mut response,
    &session::expired_cookie(state.config.session_cookie_secure),
  );
  Ok(response)
}
