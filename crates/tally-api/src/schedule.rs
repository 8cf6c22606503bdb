//! Resolved schedule endpoints. Both default to the clock's local date.

use axum::{
  Json,
  extract::{Query, State},
};
use tally_core::{
  schedule::{ResolvedSession, sessions_for_date, todays_sessions},
  session::Weekday,
  store::AttendanceStore,
  summary::{DayVerdicts, day_verdicts},
};

use crate::{ApiState, error::ApiError, sessions::DateParams};

/// `GET /schedule[?date=YYYY-MM-DD]`
pub async fn for_date<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<ResolvedSession>>, ApiError> {
  let sessions = match params.date {
    Some(date) => sessions_for_date(state.store.as_ref(), Weekday::of(date), date).await,
    None => todays_sessions(state.store.as_ref(), state.clock.as_ref()).await,
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(sessions))
}

/// `GET /verdicts[?date=YYYY-MM-DD]`
pub async fn verdicts<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<DayVerdicts>, ApiError> {
  let date = params.date.unwrap_or_else(|| state.clock.today());
  let sessions = sessions_for_date(state.store.as_ref(), Weekday::of(date), date)
    .await
    .map_err(ApiError::from_store)?;
  let settings = state.store.settings().await.map_err(ApiError::from_store)?;
  Ok(Json(day_verdicts(&sessions, settings.target_attendance)))
}
