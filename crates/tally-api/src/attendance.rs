//! Handlers for the attendance ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance` | Body: [`MarkBody`]; `date` defaults to today |
//! | `GET`  | `/history[?date=]` | All entries, or one date |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tally_core::{
  ledger::{AttendanceStatus, LedgerEntry, MarkAttendance, MarkOutcome},
  store::AttendanceStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, sessions::DateParams};

#[derive(Debug, Deserialize)]
pub struct MarkBody {
  pub session_id: Uuid,
  pub subject_id: Uuid,
  pub status:     AttendanceStatus,
  pub date:       Option<NaiveDate>,
}

/// `POST /attendance`
///
/// Marking the same session and date again replaces the earlier outcome;
/// the response carries the replaced entry.
pub async fn mark<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<MarkBody>,
) -> Result<Json<MarkOutcome>, ApiError> {
  let input = MarkAttendance {
    session_id: body.session_id,
    subject_id: body.subject_id,
    status:     body.status,
    date:       body.date.unwrap_or_else(|| state.clock.today()),
  };
  let outcome = state
    .store
    .mark_attendance(input)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

/// `GET /history[?date=YYYY-MM-DD]`
pub async fn history<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
  let entries = match params.date {
    Some(date) => state.store.history_for_date(date).await,
    None => state.store.history().await,
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}
