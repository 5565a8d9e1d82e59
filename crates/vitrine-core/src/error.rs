//! Error types for `vitrine-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown content field: {0:?}")]
  UnknownField(String),

  #[error("unknown content section: {0:?}")]
  UnknownSection(String),

  #[error("unknown catalog kind: {0:?}")]
  UnknownKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
