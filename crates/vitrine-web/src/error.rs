//! Error types and axum `IntoResponse` implementation.

use axum::{
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The route needs an authenticated admin session.
  #[error("login required")]
  LoginRequired,
  #[error("not found")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("the CSRF token is missing or invalid")]
  Csrf,
  #[error("multipart error: {0}")]
  Multipart(#[from] MultipartError),
  #[error("session layer not installed")]
  SessionMissing,
  #[error("render error: {0}")]
  Render(String),
  #[error("password hashing error: {0}")]
  Password(String),
  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error; used as `.map_err(Error::store)`.
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::LoginRequired => Redirect::to("/admin").into_response(),
      Error::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Csrf => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
      Error::Multipart(e) => (e.status(), e.body_text()).into_response(),
      other => {
        tracing::error!(error = %other, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
      }
    }
  }
}
