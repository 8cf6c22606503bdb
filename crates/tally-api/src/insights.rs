//! Threshold engine and summary endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subjects/:id/threshold` | Optional `?target=`; defaults to the configured target |
//! | `POST` | `/subjects/:id/simulate` | Body: `{"action":"skip"\|"attend"}` |
//! | `GET`  | `/subjects/:id/next-class` | `null` when nothing is scheduled |
//! | `GET`  | `/overview` | Aggregate over all subjects |
//! | `GET`  | `/alerts` | Subjects near or below target |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tally_core::{
  schedule::{NextClass, next_class as find_next_class},
  settings::validate_target,
  store::AttendanceStore,
  summary::{self, Overview, SubjectAlert},
  threshold::{self, Action, Report, Simulation},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, subjects::require};

async fn configured_target<S: AttendanceStore>(store: &S) -> Result<f64, ApiError> {
  Ok(
    store
      .settings()
      .await
      .map_err(ApiError::from_store)?
      .target_attendance,
  )
}

// ─── Threshold ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TargetParams {
  pub target: Option<f64>,
}

/// `GET /subjects/:id/threshold[?target=<percent>]`
pub async fn threshold<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<TargetParams>,
) -> Result<Json<Report>, ApiError> {
  let subject = require(state.store.as_ref(), id).await?;
  let target = match params.target {
    Some(target) => {
      validate_target(target)?;
      target
    }
    None => configured_target(state.store.as_ref()).await?,
  };
  Ok(Json(Report::new(&subject.counters, target)))
}

#[derive(Debug, Deserialize)]
pub struct SimulateBody {
  pub action: Action,
}

/// `POST /subjects/:id/simulate`
pub async fn simulate<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SimulateBody>,
) -> Result<Json<Simulation>, ApiError> {
  let subject = require(state.store.as_ref(), id).await?;
  let target = configured_target(state.store.as_ref()).await?;
  let c = subject.counters;
  Ok(Json(threshold::simulate(c.attended, c.total_held, body.action, target)))
}

/// `GET /subjects/:id/next-class`
pub async fn next_class<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Option<NextClass>>, ApiError> {
  require(state.store.as_ref(), id).await?;
  let timetable = state.store.timetable().await.map_err(ApiError::from_store)?;
  Ok(Json(find_next_class(&timetable, id, state.clock.now())))
}

// ─── Summaries ────────────────────────────────────────────────────────────────

/// `GET /overview`
pub async fn overview<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Overview>, ApiError> {
  let target = configured_target(state.store.as_ref()).await?;
  let subjects = state.store.list_subjects().await.map_err(ApiError::from_store)?;
  Ok(Json(summary::overview(&subjects, target)))
}

/// `GET /alerts`
pub async fn alerts<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<SubjectAlert>>, ApiError> {
  let target = configured_target(state.store.as_ref()).await?;
  let subjects = state.store.list_subjects().await.map_err(ApiError::from_store)?;
  Ok(Json(summary::alerts(&subjects, target)))
}
