//! Whole-store export, import and reset.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/snapshot` | Versioned JSON envelope |
//! | `PUT`    | `/snapshot` | Replaces all state; 400 leaves it untouched |
//! | `DELETE` | `/data` | Clears everything, settings included |

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use tally_core::{snapshot::Snapshot, store::AttendanceStore};

use crate::{ApiState, error::ApiError};

/// `GET /snapshot`
pub async fn export<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Snapshot>, ApiError> {
  let snapshot = state
    .store
    .export_snapshot()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(snapshot))
}

/// `PUT /snapshot`
///
/// The raw body is parsed by [`Snapshot::from_json`] so that malformed
/// documents surface as snapshot errors rather than extractor rejections.
pub async fn import<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  body: Bytes,
) -> Result<StatusCode, ApiError> {
  let snapshot = Snapshot::from_json(&body)?;
  state
    .store
    .import_snapshot(snapshot)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /data`
pub async fn clear<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<StatusCode, ApiError> {
  state.store.clear_all().await.map_err(ApiError::from_store)?;
  tracing::info!("cleared all data");
  Ok(StatusCode::NO_CONTENT)
}
