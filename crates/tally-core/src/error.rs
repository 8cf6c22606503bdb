//! Error types for `tally-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("subject name must not be empty")]
  EmptyName,

  #[error("invalid time {0:?}: expected HH:MM")]
  InvalidTime(String),

  #[error("target attendance {0} is outside (0, 100)")]
  InvalidTarget(f64),

  #[error("unknown weekday: {0:?}")]
  UnknownWeekday(String),

  #[error("unknown attendance status: {0:?}")]
  UnknownStatus(String),

  #[error("unsupported snapshot version: {0:?}")]
  UnsupportedSnapshotVersion(String),

  #[error("invalid snapshot: {0}")]
  InvalidSnapshot(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the error is a rejected input rather than a missing record.
  pub fn is_validation(&self) -> bool {
    !matches!(self, Self::SubjectNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
