//! `GET /settings` and `PUT /settings`.

use axum::{Json, extract::State};
use tally_core::{settings::Settings, store::AttendanceStore};

use crate::{ApiState, error::ApiError};

pub async fn get_all<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Settings>, ApiError> {
  let settings = state.store.settings().await.map_err(ApiError::from_store)?;
  Ok(Json(settings))
}

/// Missing fields take their defaults; an out-of-range target is a 400.
pub async fn put_all<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
  let settings = state
    .store
    .update_settings(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(settings))
}
