//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tally_core::store::AttendanceStore`]. Transport, TLS and sync are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(store.clone(), Arc::new(SystemClock)))
//! ```

pub mod attendance;
pub mod error;
pub mod insights;
pub mod schedule;
pub mod sessions;
pub mod settings;
pub mod snapshot;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use tally_core::{clock::Clock, store::AttendanceStore};

pub use error::ApiError;

/// Shared handler state: the store and the clock that defines "today".
pub struct ApiState<S> {
  pub store: Arc<S>,
  pub clock: Arc<dyn Clock>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), clock: self.clock.clone() }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Router<()>
where
  S: AttendanceStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S>)
        .patch(subjects::update::<S>)
        .delete(subjects::remove::<S>),
    )
    .route("/subjects/by-name/{name}", get(subjects::by_name::<S>))
    .route("/subjects/{id}/history", get(subjects::history::<S>))
    // Engine
    .route("/subjects/{id}/threshold", get(insights::threshold::<S>))
    .route("/subjects/{id}/simulate", post(insights::simulate::<S>))
    .route("/subjects/{id}/next-class", get(insights::next_class::<S>))
    .route("/overview", get(insights::overview::<S>))
    .route("/alerts", get(insights::alerts::<S>))
    // Timetable and extra sessions
    .route("/timetable", get(sessions::timetable::<S>))
    .route(
      "/timetable/{weekday}",
      get(sessions::day::<S>).post(sessions::add_recurring::<S>),
    )
    .route("/timetable/{weekday}/{id}", delete(sessions::remove_recurring::<S>))
    .route(
      "/one-offs",
      get(sessions::list_one_offs::<S>).post(sessions::add_one_off::<S>),
    )
    .route("/one-offs/{id}", delete(sessions::remove_one_off::<S>))
    .route(
      "/notes/{session_id}",
      get(sessions::get_note::<S>).put(sessions::put_note::<S>),
    )
    // Ledger
    .route("/attendance", post(attendance::mark::<S>))
    .route("/history", get(attendance::history::<S>))
    // Schedule
    .route("/schedule", get(schedule::for_date::<S>))
    .route("/verdicts", get(schedule::verdicts::<S>))
    // Settings and bulk
    .route("/settings", get(settings::get_all::<S>).put(settings::put_all::<S>))
    .route(
      "/snapshot",
      get(snapshot::export::<S>).put(snapshot::import::<S>),
    )
    .route("/data", delete(snapshot::clear::<S>))
    .with_state(ApiState { store, clock })
}
