//! The `AttendanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `tally-store-sqlite`).
//! The resolver, the API and the sync worker take a store handle rather than
//! reaching for global state.

use std::{collections::BTreeMap, future::Future};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  ledger::{LedgerEntry, MarkAttendance, MarkOutcome},
  session::{NewSession, OneOffSession, RecurringSession, Timetable, Weekday},
  settings::Settings,
  snapshot::Snapshot,
  subject::{NewSubject, Subject, SubjectPatch},
};

/// Backend errors that may wrap a domain error.
///
/// Lets callers tell a rejected input or a missing subject apart from an
/// infrastructure failure without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn core_error(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Tally store backend.
///
/// Every mutating method is one atomic unit: it either commits completely or
/// leaves the store untouched. Subject counters change only through
/// [`AttendanceStore::mark_attendance`] (and wholesale through import/clear).
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AttendanceStore: Send + Sync {
  type Error: StoreError;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Create a subject with zeroed counters. Rejects a blank name.
  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Case-insensitive exact match on the subject name.
  fn find_subject_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + 'a;

  /// All subjects in creation order.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Change name and/or colour. Returns `None` if the subject does not exist.
  fn update_subject(
    &self,
    id: Uuid,
    patch: SubjectPatch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete a subject together with its recurring sessions and ledger
  /// entries. One-off sessions are left in place and become orphans.
  /// Returns `false` if the subject did not exist.
  fn delete_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Append a recurring session to `weekday`. The subject must exist.
  fn add_recurring(
    &self,
    weekday: Weekday,
    input: NewSession,
  ) -> impl Future<Output = Result<RecurringSession, Self::Error>> + Send + '_;

  /// Returns `false` if no such session exists on `weekday`.
  fn remove_recurring(
    &self,
    weekday: Weekday,
    session_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// One weekday bucket, by start time then insertion order.
  fn recurring_for(
    &self,
    weekday: Weekday,
  ) -> impl Future<Output = Result<Vec<RecurringSession>, Self::Error>> + Send + '_;

  fn timetable(
    &self,
  ) -> impl Future<Output = Result<Timetable, Self::Error>> + Send + '_;

  /// Schedule an extra session on `date`. The subject must exist.
  fn add_one_off(
    &self,
    date: NaiveDate,
    input: NewSession,
  ) -> impl Future<Output = Result<OneOffSession, Self::Error>> + Send + '_;

  fn remove_one_off(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// One-off sessions on `date`, in insertion order.
  fn one_offs_for(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<OneOffSession>, Self::Error>> + Send + '_;

  fn one_offs(
    &self,
  ) -> impl Future<Output = Result<Vec<OneOffSession>, Self::Error>> + Send + '_;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Store a trimmed note for a session; blank text deletes the note.
  /// Returns the note as stored.
  fn set_note(
    &self,
    session_id: Uuid,
    text: String,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn note(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn notes(
    &self,
  ) -> impl Future<Output = Result<BTreeMap<Uuid, String>, Self::Error>> + Send + '_;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Record the outcome of a session on a date.
  ///
  /// If an entry already exists for `(session_id, date)` its counter effect
  /// is reversed (against the subject it was recorded for) before the new
  /// status is applied and the entry replaced. The whole sequence is one
  /// critical section, so marking twice with the same input leaves counters
  /// as if marked once.
  fn mark_attendance(
    &self,
    input: MarkAttendance,
  ) -> impl Future<Output = Result<MarkOutcome, Self::Error>> + Send + '_;

  /// Entries for one subject, newest date first.
  fn history_for_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + '_;

  /// Entries recorded for one calendar date.
  fn history_for_date(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + '_;

  fn history(
    &self,
  ) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn settings(
    &self,
  ) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  /// Replace settings after validating them.
  fn update_settings(
    &self,
    settings: Settings,
  ) -> impl Future<Output = Result<Settings, Self::Error>> + Send + '_;

  // ── Bulk ──────────────────────────────────────────────────────────────

  fn export_snapshot(
    &self,
  ) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send + '_;

  /// Validate `snapshot` and replace all local state with it. On any error
  /// the existing state is untouched.
  fn import_snapshot(
    &self,
    snapshot: Snapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove everything and restore default settings.
  fn clear_all(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
