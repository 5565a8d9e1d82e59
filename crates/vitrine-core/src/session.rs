//! Server-side session records backing the admin cookie.
//!
//! The cookie carries an opaque random token; only a keyed hash of it is
//! persisted. A session with a `username` is authenticated, one without is an
//! anonymous visitor that can still receive flash messages and a CSRF token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token_hash: String,
  pub username:   Option<String>,
  pub csrf_token: String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_authenticated(&self) -> bool { self.username.is_some() }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

/// Severity of a flash message, matching the CSS class it is shown with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
  Success,
  Danger,
}

impl FlashLevel {
  pub fn as_str(self) -> &'static str {
    match self {
      FlashLevel::Success => "success",
      FlashLevel::Danger => "danger",
    }
  }
}

/// A one-shot status line shown on the next rendered admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
  pub level:   FlashLevel,
  pub message: String,
}

impl Flash {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Success, message: message.into() }
  }

  pub fn danger(message: impl Into<String>) -> Self {
    Self { level: FlashLevel::Danger, message: message.into() }
  }
}
