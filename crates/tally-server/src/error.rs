//! Error type for snapshot sync.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("snapshot error: {0}")]
  Snapshot(#[from] tally_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("gave up after {attempts} attempts: {last}")]
  GaveUp {
    attempts: u32,
    #[source]
    last:     Box<Error>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
