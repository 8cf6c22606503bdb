//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Creation order |
//! | `POST`   | `/subjects` | Body: `{"name":"Maths","color":"#3366ff"}` |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `PATCH`  | `/subjects/:id` | Body: `{"name"?, "color"?}` |
//! | `DELETE` | `/subjects/:id` | Cascades to timetable and history |
//! | `GET`    | `/subjects/by-name/:name` | Case-insensitive |
//! | `GET`    | `/subjects/:id/history` | Newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use tally_core::{
  ledger::LedgerEntry,
  store::AttendanceStore,
  subject::{NewSubject, Subject, SubjectPatch},
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Fetch a subject or fail with 404.
pub(crate) async fn require<S: AttendanceStore>(
  store: &S,
  id: Uuid,
) -> Result<Subject, ApiError> {
  store
    .get_subject(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = state
    .store
    .list_subjects()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects`
pub async fn create<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = state
    .store
    .add_subject(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  Ok(Json(require(state.store.as_ref(), id).await?))
}

/// `GET /subjects/by-name/:name`
pub async fn by_name<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(name): Path<String>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state
    .store
    .find_subject_by_name(&name)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("no subject named {name:?}")))?;
  Ok(Json(subject))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /subjects/:id`
pub async fn update<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<SubjectPatch>,
) -> Result<Json<Subject>, ApiError> {
  let subject = state
    .store
    .update_subject(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

/// `DELETE /subjects/:id`
pub async fn remove<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let deleted = state
    .store
    .delete_subject(id)
    .await
    .map_err(ApiError::from_store)?;
  if !deleted {
    return Err(ApiError::NotFound(format!("subject {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id/history`
pub async fn history<S: AttendanceStore>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
  require(state.store.as_ref(), id).await?;
  let entries = state
    .store
    .history_for_subject(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}
