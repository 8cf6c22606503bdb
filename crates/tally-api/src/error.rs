//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::store::StoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Sort a backend error into 404, 400 or 500 by its domain cause.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.core_error() {
      Some(core) if core.is_validation() => Self::BadRequest(core.to_string()),
      Some(core) => Self::NotFound(core.to_string()),
      None => Self::Store(Box::new(err)),
    }
  }
}

impl From<tally_core::Error> for ApiError {
  fn from(err: tally_core::Error) -> Self {
    if err.is_validation() {
      Self::BadRequest(err.to_string())
    } else {
      Self::NotFound(err.to_string())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
