//! Cookie-backed server-side sessions for the admin area.
//!
//! The browser holds an opaque random token in the `vitrine_session` cookie.
//! The store only ever sees `sha256(secret ‖ token)`, so a leaked database
//! does not yield usable cookies.
//!
//! [`layer`] runs in front of every `/admin` route. It resolves the cookie to
//! a live [`Session`] or starts a fresh anonymous one, and exposes it to
//! handlers through the [`Visitor`] and [`AdminSession`] extractors.

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, HeaderValue, header, request::Parts},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest, Sha256};
use vitrine_core::{
  session::{Flash, Session},
  store::SessionStore,
};

use crate::{AppState, error::Error};

pub const COOKIE_NAME: &str = "vitrine_session";

/// Upper bound on a configured session lifetime (one year).
const MAX_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

// ─── Tokens ──────────────────────────────────────────────────────────────────

fn random_bytes<const N: usize>() -> [u8; N] {
  let mut bytes = [0u8; N];
  OsRng.fill_bytes(&mut bytes);
  bytes
}

/// A fresh 32-byte cookie token, URL-safe base64.
pub fn new_token() -> String { URL_SAFE_NO_PAD.encode(random_bytes::<32>()) }

/// A fresh random secret, hex encoded.
pub fn new_secret() -> String { hex::encode(random_bytes::<32>()) }

/// The keyed hash under which a token's session is stored.
pub fn hash_token(secret: &str, token: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(secret.as_bytes());
  hasher.update(token.as_bytes());
  hex::encode(hasher.finalize())
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// Value of cookie `name` from any `Cookie` header on the request.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(k, _)| *k == name)
    .map(|(_, v)| v.to_owned())
}

/// `Set-Cookie` value carrying `token` for `max_age_secs`.
pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> String {
  let mut cookie =
    format!("{COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn expired_cookie(secure: bool) -> String { session_cookie("", 0, secure) }

pub fn set_cookie(response: &mut Response, cookie: &str) {
  match HeaderValue::from_str(cookie) {
    Ok(value) => {
      response.headers_mut().append(header::SET_COOKIE, value);
    }
    Err(e) => tracing::error!(error = %e, "unencodable session cookie"),
  }
}

// ─── Active session ──────────────────────────────────────────────────────────

/// The session resolved for this request, plus the raw cookie token.
#[derive(Debug, Clone)]
pub struct ActiveSession {
  pub token:   String,
  pub session: Session,
}

impl ActiveSession {
  pub fn csrf_token(&self) -> &str { &self.session.csrf_token }

  pub fn username(&self) -> Option<&str> { self.session.username.as_deref() }

  pub fn cookie<S: SessionStore>(&self, state: &AppState<S>) -> String {
    session_cookie(&self.token, lifetime_secs(state), state.config.session_cookie_secure)
  }

  pub async fn flash<S: SessionStore>(&self, store: &S, flash: Flash) -> Result<(), Error> {
    store
      .push_flash(&self.session.token_hash, flash)
      .await
      .map_err(Error::store)
  }

  pub async fn take_flashes<S: SessionStore>(&self, store: &S) -> Result<Vec<Flash>, Error> {
    store
      .take_flashes(&self.session.token_hash)
      .await
      .map_err(Error::store)
  }

  /// Reject the form unless it echoes this session's CSRF token.
  pub fn verify_csrf(&self, submitted: Option<&str>) -> Result<(), Error> {
    match submitted {
      Some(token) if !token.is_empty() && token == self.session.csrf_token => Ok(()),
      _ => Err(Error::Csrf),
    }
  }
}

fn lifetime_secs<S>(state: &AppState<S>) -> u64 {
  state.config.session_lifetime_secs.min(MAX_LIFETIME_SECS)
}

/// Expiry of a session last used at `now`.
fn expiry<S>(state: &AppState<S>, now: DateTime<Utc>) -> DateTime<Utc> {
  now + Duration::seconds(lifetime_secs(state) as i64)
}

/// Create and persist a new session; authenticated when `username` is set.
pub async fn start<S: SessionStore>(
  state: &AppState<S>,
  username: Option<String>,
) -> Result<ActiveSession, Error> {
  let now = Utc::now();
  let token = new_token();
  let session = Session {
    token_hash: hash_token(&state.session_secret, &token),
    username,
    csrf_token: new_secret(),
    created_at: now,
    expires_at: expiry(state, now),
  };
  state
    .store
    .create_session(session.clone())
    .await
    .map_err(Error::store)?;
  Ok(ActiveSession { token, session })
}

/// Resolve the request cookie to a live session, if any, and push its
/// expiry a full lifetime past this request.
async fn resume<S: SessionStore>(
  state: &AppState<S>,
  headers: &HeaderMap,
) -> Result<Option<ActiveSession>, Error> {
  let Some(token) = cookie_value(headers, COOKIE_NAME).filter(|t| !t.is_empty()) else {
    return Ok(None);
  };
  let hash = hash_token(&state.session_secret, &token);
  let now = Utc::now();
  let Some(mut session) = state
    .store
    .get_session(&hash)
    .await
    .map_err(Error::store)?
    .filter(|s| !s.is_expired(now))
  else {
    return Ok(None);
  };

  let expires_at = expiry(state, now);
  if !state
    .store
    .touch_session(&hash, expires_at)
    .await
    .map_err(Error::store)?
  {
    return Ok(None);
  }
  session.expires_at = expires_at;
  Ok(Some(ActiveSession { token, session }))
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Attach an [`ActiveSession`] to the request, starting one if needed.
pub async fn layer<S: SessionStore + 'static>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let active = match resume(&state, req.headers()).await? {
    Some(active) => active,
    None => {
      let purged = state
        .store
        .purge_expired_sessions(Utc::now())
        .await
        .map_err(Error::store)?;
      if purged > 0 {
        tracing::debug!(purged, "purged expired sessions");
      }
      start(&state, None).await?
    }
  };

  let cookie = active.cookie(&state);
  req.extensions_mut().insert(active);
  let mut response = next.run(req).await;

  // Re-issued on every response so the browser's expiry slides with the
  // store's. Handlers that rotate or end the session set their own cookie.
  if !response.headers().contains_key(header::SET_COOKIE) {
    set_cookie(&mut response, &cookie);
  }
  Ok(response)
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Any visitor to the admin area, logged in or not.
pub struct Visitor(pub ActiveSession);

impl<St: Send + Sync> FromRequestParts<St> for Visitor {
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<ActiveSession>()
      .cloned()
      .map(Visitor)
      .ok_or(Error::SessionMissing)
  }
}

/// An authenticated admin; anyone else is redirected to the login page.
pub struct AdminSession {
  pub session:  ActiveSession,
  pub username: String,
}

impl<St: Send + Sync> FromRequestParts<St> for AdminSession {
  type Rejection = Error;

  async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
    let Visitor(session) = Visitor::from_request_parts(parts, state).await?;
    match session.session.username.clone() {
      Some(username) => Ok(AdminSession { session, username }),
      None => Err(Error::LoginRequired),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_are_long_and_unique() {
    let (a, b) = (new_token(), new_token());
    assert_eq!(a.len(), 43);
    assert_ne!(a, b);
    assert!(!a.contains(['+', '/', '=']));
  }

  #[test]
  fn token_hash_depends_on_secret() {
    let token = new_token();
    assert_eq!(hash_token("s1", &token), hash_token("s1", &token));
    assert_ne!(hash_token("s1", &token), hash_token("s2", &token));
    assert_eq!(hash_token("s1", &token).len(), 64);
  }

  #[test]
  fn cookie_lookup_handles_multiple_pairs_and_headers() {
    let mut headers = HeaderMap::new();
    headers.append(header::COOKIE, HeaderValue::from_static("theme=dark; lang=en"));
    headers.append(header::COOKIE, HeaderValue::from_static("vitrine_session=abc-123"));
    assert_eq!(cookie_value(&headers, COOKIE_NAME).as_deref(), Some("abc-123"));
    assert_eq!(cookie_value(&headers, "lang").as_deref(), Some("en"));
    assert!(cookie_value(&headers, "missing").is_none());
  }

  #[test]
  fn cookie_attributes() {
    let cookie = session_cookie("tok", 3600, false);
    assert_eq!(cookie, "vitrine_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");
    assert!(session_cookie("tok", 3600, true).ends_with("; Secure"));
    assert!(expired_cookie(false).contains("Max-Age=0"));
  }

  #[test]
  fn csrf_must_match_exactly() {
    let now = Utc::now();
    let active = ActiveSession {
      token:   "t".into(),
      session: Session {
        token_hash: "h".into(),
        username:   None,
        csrf_token: "expected".into(),
        created_at: now,
        expires_at: now,
      },
    };
    assert!(active.verify_csrf(Some("expected")).is_ok());
    assert!(matches!(active.verify_csrf(Some("other")), Err(Error::Csrf)));
    assert!(matches!(active.verify_csrf(None), Err(Error::Csrf)));
  }
}
