//! Handlers for the weekly timetable, one-off sessions and session notes.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/timetable` | Every weekday bucket |
//! | `GET`    | `/timetable/:weekday` | One bucket |
//! | `POST`   | `/timetable/:weekday` | Body: [`NewSession`] |
//! | `DELETE` | `/timetable/:weekday/:id` | |
//! | `GET`    | `/one-offs[?date=]` | All, or one date |
//! | `POST`   | `/one-offs` | Body: [`NewOneOffBody`] |
//! | `DELETE` | `/one-offs/:id` | |
//! | `GET`    | `/notes/:session_id` | 404 if unset |
//! | `PUT`    | `/notes/:session_id` | Body: `{"text":"..."}`; blank deletes |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_core::{
  session::{NewSession, OneOffSession, RecurringSession, Timetable, Weekday},
  store::AttendanceStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Timetable ────────────────────────────────────────────────────────────────

/// `GET /timetable`
pub async fn timetable<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Timetable>, ApiError> {
  let timetable = state.store.timetable().await.map_err(ApiError::from_store)?;
  Ok(Json(timetable))
}

/// `GET /timetable/:weekday`
pub async fn day<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(weekday): Path<String>,
) -> Result<Json<Vec<RecurringSession>>, ApiError> {
  let weekday = Weekday::parse(&weekday)?;
  let sessions = state
    .store
    .recurring_for(weekday)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(sessions))
}

/// `POST /timetable/:weekday`
pub async fn add_recurring<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(weekday): Path<String>,
  Json(body): Json<NewSession>,
) -> Result<impl IntoResponse, ApiError> {
  let weekday = Weekday::parse(&weekday)?;
  let session = state
    .store
    .add_recurring(weekday, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(session)))
}

/// `DELETE /timetable/:weekday/:id`
pub async fn remove_recurring<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path((weekday, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
  let weekday = Weekday::parse(&weekday)?;
  let removed = state
    .store
    .remove_recurring(weekday, id)
    .await
    .map_err(ApiError::from_store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("no session {id} on {weekday}")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── One-offs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DateParams {
  pub date: Option<NaiveDate>,
}

/// `GET /one-offs[?date=YYYY-MM-DD]`
pub async fn list_one_offs<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Query(params): Query<DateParams>,
) -> Result<Json<Vec<OneOffSession>>, ApiError> {
  let sessions = match params.date {
    Some(date) => state.store.one_offs_for(date).await,
    None => state.store.one_offs().await,
  }
  .map_err(ApiError::from_store)?;
  Ok(Json(sessions))
}

#[derive(Debug, Deserialize)]
pub struct NewOneOffBody {
  pub date:    NaiveDate,
  #[serde(flatten)]
  pub session: NewSession,
}

/// `POST /one-offs`
pub async fn add_one_off<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewOneOffBody>,
) -> Result<impl IntoResponse, ApiError> {
  let session = state
    .store
    .add_one_off(body.date, body.session)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(session)))
}

/// `DELETE /one-offs/:id`
pub async fn remove_one_off<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let removed = state
    .store
    .remove_one_off(id)
    .await
    .map_err(ApiError::from_store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("one-off session {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Notes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteBody {
  pub text: String,
}

/// `GET /notes/:session_id`
pub async fn get_note<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(session_id): Path<Uuid>,
) -> Result<Json<NoteBody>, ApiError> {
  let text = state
    .store
    .note(session_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no note for session {session_id}")))?;
  Ok(Json(NoteBody { text }))
}

/// `PUT /notes/:session_id`. Answers `204` when the note was cleared.
pub async fn put_note<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(session_id): Path<Uuid>,
  Json(body): Json<NoteBody>,
) -> Result<axum::response::Response, ApiError> {
  let stored = state
    .store
    .set_note(session_id, body.text)
    .await
    .map_err(ApiError::from_store)?;
  Ok(match stored {
    Some(text) => Json(NoteBody { text }).into_response(),
    None => StatusCode::NO_CONTENT.into_response(),
  })
}
