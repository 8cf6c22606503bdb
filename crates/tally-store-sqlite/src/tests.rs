//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use tally_core::{
  event::StoreEvent,
  ledger::{AttendanceStatus, MarkAttendance},
  schedule::sessions_for_date,
  session::{NewSession, Weekday},
  settings::Settings,
  store::{AttendanceStore, StoreError as _},
  subject::{Counters, NewSubject, SubjectPatch},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn monday() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 19).unwrap() }

fn session(subject_id: Uuid, time: &str) -> NewSession {
  NewSession::new(subject_id, time.parse().unwrap())
}

fn mark(
  subject_id: Uuid,
  session_id: Uuid,
  status: AttendanceStatus,
  date: NaiveDate,
) -> MarkAttendance {
  MarkAttendance { session_id, subject_id, status, date }
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let subject = s.add_subject(NewSubject::new("  Physics ", "#ff0000")).await.unwrap();
  assert_eq!(subject.name, "Physics");
  assert_eq!(subject.counters, Counters::default());

  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched, subject);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn blank_name_is_a_validation_error() {
  let s = store().await;
  let err = s.add_subject(NewSubject::new("   ", "#000000")).await.unwrap_err();
  assert!(matches!(err.core_error(), Some(tally_core::Error::EmptyName)));
  assert!(s.list_subjects().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_subjects_in_creation_order() {
  let s = store().await;
  for name in ["Maths", "Art", "Biology"] {
    s.add_subject(NewSubject::new(name, "#111111")).await.unwrap();
  }
  let names: Vec<_> = s
    .list_subjects()
    .await
    .unwrap()
    .into_iter()
    .map(|s| s.name)
    .collect();
  assert_eq!(names, ["Maths", "Art", "Biology"]);
}

#[tokio::test]
async fn find_subject_by_name_ignores_case() {
  let s = store().await;
  let subject = s.add_subject(NewSubject::new("Chemistry", "#00ff00")).await.unwrap();

  let found = s.find_subject_by_name("chemISTRY").await.unwrap().unwrap();
  assert_eq!(found.subject_id, subject.subject_id);
  assert!(s.find_subject_by_name("Chem").await.unwrap().is_none());
}

#[tokio::test]
async fn update_subject_changes_only_patched_fields() {
  let s = store().await;
  let subject = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap();

  let patch = SubjectPatch { name: Some("Further Maths".into()), color: None };
  let updated = s.update_subject(subject.subject_id, patch).await.unwrap().unwrap();
  assert_eq!(updated.name, "Further Maths");
  assert_eq!(updated.color, "#111111");

  let missing = s
    .update_subject(Uuid::new_v4(), SubjectPatch::default())
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn delete_subject_cascades_but_keeps_one_offs() {
  let s = store().await;
  let subject = s.add_subject(NewSubject::new("History", "#abcdef")).await.unwrap();
  let id = subject.subject_id;

  let rec = s.add_recurring(Weekday::Monday, session(id, "09:00")).await.unwrap();
  let extra = s.add_one_off(monday(), session(id, "14:00")).await.unwrap();
  s.set_note(rec.session_id, "bring notes".into()).await.unwrap();
  s.mark_attendance(mark(id, rec.session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();

  assert!(s.delete_subject(id).await.unwrap());
  assert!(!s.delete_subject(id).await.unwrap());

  assert!(s.get_subject(id).await.unwrap().is_none());
  assert!(s.recurring_for(Weekday::Monday).await.unwrap().is_empty());
  assert!(s.history_for_subject(id).await.unwrap().is_empty());
  assert!(s.note(rec.session_id).await.unwrap().is_none());

  let orphans = s.one_offs().await.unwrap();
  assert_eq!(orphans.len(), 1);
  assert_eq!(orphans[0].session_id, extra.session_id);

  // The orphan is no longer resolvable on its date.
  let resolved = sessions_for_date(&s, Weekday::Monday, monday()).await.unwrap();
  assert!(resolved.is_empty());
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_require_an_existing_subject() {
  let s = store().await;
  let ghost = Uuid::new_v4();

  let err = s.add_recurring(Weekday::Friday, session(ghost, "10:00")).await.unwrap_err();
  assert!(matches!(err.core_error(), Some(tally_core::Error::SubjectNotFound(id)) if *id == ghost));

  let err = s.add_one_off(monday(), session(ghost, "10:00")).await.unwrap_err();
  assert!(matches!(err.core_error(), Some(tally_core::Error::SubjectNotFound(_))));
}

#[tokio::test]
async fn recurring_sessions_sort_by_start_time() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;

  s.add_recurring(Weekday::Tuesday, session(id, "11:00")).await.unwrap();
  s.add_recurring(Weekday::Tuesday, session(id, "09:30")).await.unwrap();
  s.add_recurring(Weekday::Wednesday, session(id, "08:00")).await.unwrap();

  let tuesday: Vec<_> = s
    .recurring_for(Weekday::Tuesday)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.start_time.to_string())
    .collect();
  assert_eq!(tuesday, ["09:30", "11:00"]);

  let timetable = s.timetable().await.unwrap();
  assert_eq!(timetable.day(Weekday::Tuesday).len(), 2);
  assert_eq!(timetable.day(Weekday::Wednesday).len(), 1);
  assert!(timetable.day(Weekday::Sunday).is_empty());
}

#[tokio::test]
async fn remove_recurring_checks_the_weekday() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let rec = s.add_recurring(Weekday::Monday, session(id, "09:00")).await.unwrap();

  assert!(!s.remove_recurring(Weekday::Tuesday, rec.session_id).await.unwrap());
  assert!(s.remove_recurring(Weekday::Monday, rec.session_id).await.unwrap());
  assert!(s.timetable().await.unwrap().day(Weekday::Monday).is_empty());
}

#[tokio::test]
async fn one_offs_are_filtered_by_date() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let tuesday = monday().succ_opt().unwrap();

  let first = s.add_one_off(monday(), session(id, "16:00")).await.unwrap();
  s.add_one_off(tuesday, session(id, "16:00")).await.unwrap();

  let on_monday = s.one_offs_for(monday()).await.unwrap();
  assert_eq!(on_monday.len(), 1);
  assert_eq!(on_monday[0].session_id, first.session_id);

  assert!(s.remove_one_off(first.session_id).await.unwrap());
  assert!(!s.remove_one_off(first.session_id).await.unwrap());
  assert_eq!(s.one_offs().await.unwrap().len(), 1);
}

// ─── Schedule ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_merges_recurring_and_extra_sessions() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new("A", "#111111")).await.unwrap().subject_id;
  let b = s.add_subject(NewSubject::new("B", "#222222")).await.unwrap().subject_id;

  s.add_recurring(Weekday::Monday, session(a, "09:00")).await.unwrap();
  s.add_recurring(Weekday::Monday, session(b, "11:00")).await.unwrap();
  let extra = s.add_one_off(monday(), session(b, "10:00")).await.unwrap();
  // A Tuesday extra must not leak into Monday.
  s.add_one_off(monday().succ_opt().unwrap(), session(a, "08:00")).await.unwrap();

  s.mark_attendance(mark(b, extra.session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();

  let day = sessions_for_date(&s, Weekday::Monday, monday()).await.unwrap();
  let order: Vec<_> = day.iter().map(|r| (r.subject.name.as_str(), r.is_extra)).collect();
  assert_eq!(order, [("A", false), ("B", true), ("B", false)]);
  assert_eq!(day[1].status, Some(AttendanceStatus::Attended));
  assert_eq!(day[0].status, None);
}

#[tokio::test]
async fn equal_start_times_put_recurring_first() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new("A", "#111111")).await.unwrap().subject_id;
  let b = s.add_subject(NewSubject::new("B", "#222222")).await.unwrap().subject_id;

  s.add_one_off(monday(), session(a, "09:00")).await.unwrap();
  s.add_recurring(Weekday::Monday, session(b, "09:00")).await.unwrap();

  let day = sessions_for_date(&s, Weekday::Monday, monday()).await.unwrap();
  assert!(!day[0].is_extra);
  assert!(day[1].is_extra);
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn marking_updates_counters() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let date = monday();

  for (day, status) in [
    AttendanceStatus::Attended,
    AttendanceStatus::Missed,
    AttendanceStatus::Cancelled,
  ]
  .into_iter()
  .enumerate()
  {
    let date = date + chrono::Days::new(day as u64);
    s.mark_attendance(mark(id, Uuid::new_v4(), status, date)).await.unwrap();
  }

  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters, Counters { attended: 1, total_held: 2, cancelled: 1 });
}

#[tokio::test]
async fn marking_twice_is_idempotent() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  let first = s
    .mark_attendance(mark(id, session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  assert!(first.replaced.is_none());

  let second = s
    .mark_attendance(mark(id, session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  assert_eq!(second.replaced.unwrap().entry_id, first.entry.entry_id);

  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters, Counters { attended: 1, total_held: 1, cancelled: 0 });
  assert_eq!(s.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn correction_reverses_the_prior_effect() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  s.mark_attendance(mark(id, session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  let outcome = s
    .mark_attendance(mark(id, session_id, AttendanceStatus::Cancelled, monday()))
    .await
    .unwrap();
  assert_eq!(outcome.replaced.unwrap().status, AttendanceStatus::Attended);

  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters, Counters { attended: 0, total_held: 0, cancelled: 1 });

  let history = s.history_for_date(monday()).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].status, AttendanceStatus::Cancelled);
}

#[tokio::test]
async fn correction_across_subjects_reverses_the_old_subject() {
  let s = store().await;
  let a = s.add_subject(NewSubject::new("A", "#111111")).await.unwrap().subject_id;
  let b = s.add_subject(NewSubject::new("B", "#222222")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  s.mark_attendance(mark(a, session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  s.mark_attendance(mark(b, session_id, AttendanceStatus::Missed, monday()))
    .await
    .unwrap();

  assert_eq!(s.get_subject(a).await.unwrap().unwrap().counters, Counters::default());
  assert_eq!(
    s.get_subject(b).await.unwrap().unwrap().counters,
    Counters { attended: 0, total_held: 1, cancelled: 0 }
  );
}

#[tokio::test]
async fn marking_unknown_subject_has_no_side_effects() {
  let s = store().await;
  let ghost = Uuid::new_v4();

  let err = s
    .mark_attendance(mark(ghost, Uuid::new_v4(), AttendanceStatus::Attended, monday()))
    .await
    .unwrap_err();
  assert!(matches!(err.core_error(), Some(tally_core::Error::SubjectNotFound(_))));
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn reversal_floors_counters_at_zero() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  s.mark_attendance(mark(id, session_id, AttendanceStatus::Cancelled, monday()))
    .await
    .unwrap();
  s.force_counters(id, Counters::default()).await.unwrap();

  s.mark_attendance(mark(id, session_id, AttendanceStatus::Missed, monday()))
    .await
    .unwrap();
  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters, Counters { attended: 0, total_held: 1, cancelled: 0 });
}

#[tokio::test]
async fn correction_keeps_counters_consistent_after_drift() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  s.mark_attendance(mark(id, session_id, AttendanceStatus::Missed, monday()))
    .await
    .unwrap();
  s.force_counters(id, Counters { attended: 1, total_held: 1, cancelled: 0 })
    .await
    .unwrap();

  s.mark_attendance(mark(id, session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters, Counters { attended: 1, total_held: 1, cancelled: 0 });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_marks_of_one_slot_count_once() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let session_id = Uuid::new_v4();

  let tasks: Vec<_> = (0..50)
    .map(|i| {
      let s = s.clone();
      let status = if i % 2 == 0 {
        AttendanceStatus::Attended
      } else {
        AttendanceStatus::Missed
      };
      tokio::spawn(async move {
        s.mark_attendance(mark(id, session_id, status, monday())).await
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let counters = s.get_subject(id).await.unwrap().unwrap().counters;
  assert_eq!(counters.total_held, 1);
  assert!(counters.attended <= 1);
  assert_eq!(counters.cancelled, 0);
  assert_eq!(s.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn history_for_subject_is_newest_first() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let tuesday = monday().succ_opt().unwrap();

  s.mark_attendance(mark(id, Uuid::new_v4(), AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  s.mark_attendance(mark(id, Uuid::new_v4(), AttendanceStatus::Missed, tuesday))
    .await
    .unwrap();

  let dates: Vec<_> = s
    .history_for_subject(id)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.date)
    .collect();
  assert_eq!(dates, [tuesday, monday()]);
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn notes_are_trimmed_and_blank_deletes() {
  let s = store().await;
  let session_id = Uuid::new_v4();

  let stored = s.set_note(session_id, "  quiz on ch. 4 \n".into()).await.unwrap();
  assert_eq!(stored.as_deref(), Some("quiz on ch. 4"));
  assert_eq!(s.note(session_id).await.unwrap().as_deref(), Some("quiz on ch. 4"));

  s.set_note(session_id, "lab report".into()).await.unwrap();
  assert_eq!(s.notes().await.unwrap().get(&session_id).map(String::as_str), Some("lab report"));

  assert!(s.set_note(session_id, "   ".into()).await.unwrap().is_none());
  assert!(s.note(session_id).await.unwrap().is_none());
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_default_then_persist() {
  let s = store().await;
  assert_eq!(s.settings().await.unwrap(), Settings::default());

  let wanted = Settings { target_attendance: 80.0, ..Settings::default() };
  s.update_settings(wanted.clone()).await.unwrap();
  assert_eq!(s.settings().await.unwrap(), wanted);
}

#[tokio::test]
async fn invalid_target_is_rejected() {
  let s = store().await;
  for target in [0.0, 100.0, -5.0, f64::NAN] {
    let settings = Settings { target_attendance: target, ..Settings::default() };
    let err = s.update_settings(settings).await.unwrap_err();
    assert!(err.core_error().is_some_and(tally_core::Error::is_validation));
  }
  assert_eq!(s.settings().await.unwrap().target_attendance, 75.0);
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

async fn populated() -> SqliteStore {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  let rec = s.add_recurring(Weekday::Monday, session(id, "09:00")).await.unwrap();
  s.add_one_off(monday(), session(id, "15:00")).await.unwrap();
  s.set_note(rec.session_id, "homework due".into()).await.unwrap();
  s.mark_attendance(mark(id, rec.session_id, AttendanceStatus::Attended, monday()))
    .await
    .unwrap();
  s.update_settings(Settings { target_attendance: 85.0, ..Settings::default() })
    .await
    .unwrap();
  s
}

#[tokio::test]
async fn export_import_restores_everything() {
  let source = populated().await;
  let exported = source.export_snapshot().await.unwrap();
  assert_eq!(exported.version, "1.0");

  let target = store().await;
  target.add_subject(NewSubject::new("Stale", "#000000")).await.unwrap();
  target.import_snapshot(exported.clone()).await.unwrap();

  let again = target.export_snapshot().await.unwrap();
  assert_eq!(again.subjects, exported.subjects);
  assert_eq!(again.recurring_sessions, exported.recurring_sessions);
  assert_eq!(again.one_off_sessions, exported.one_off_sessions);
  assert_eq!(again.history, exported.history);
  assert_eq!(again.settings, exported.settings);
  assert_eq!(again.notes, exported.notes);
}

#[tokio::test]
async fn invalid_import_leaves_state_untouched() {
  let s = populated().await;
  let before = s.export_snapshot().await.unwrap();

  let mut bad = before.clone();
  bad.version = "2.0".into();
  assert!(s.import_snapshot(bad).await.is_err());

  let mut dangling = before.clone();
  dangling.subjects.clear();
  assert!(s.import_snapshot(dangling).await.is_err());

  let after = s.export_snapshot().await.unwrap();
  assert_eq!(after.subjects, before.subjects);
  assert_eq!(after.history, before.history);
}

#[tokio::test]
async fn import_rejects_counters_smaller_than_history() {
  let s = store().await;
  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  s.mark_attendance(mark(id, Uuid::new_v4(), AttendanceStatus::Missed, monday()))
    .await
    .unwrap();
  let before = s.export_snapshot().await.unwrap();

  let mut drifted = before.clone();
  drifted.subjects[0].counters = Counters { attended: 1, total_held: 1, cancelled: 0 };
  let err = s.import_snapshot(drifted).await.unwrap_err();
  assert!(matches!(err.core_error(), Some(tally_core::Error::InvalidSnapshot(_))));

  let after = s.export_snapshot().await.unwrap();
  assert_eq!(after.subjects, before.subjects);
  assert_eq!(after.history, before.history);
}

#[tokio::test]
async fn clear_all_restores_defaults() {
  let s = populated().await;
  s.clear_all().await.unwrap();

  assert!(s.list_subjects().await.unwrap().is_empty());
  assert!(s.one_offs().await.unwrap().is_empty());
  assert!(s.history().await.unwrap().is_empty());
  assert!(s.notes().await.unwrap().is_empty());
  assert_eq!(s.settings().await.unwrap(), Settings::default());
}

// ─── Outbox ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_are_announced_on_the_outbox() {
  let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
  let s = store().await.with_outbox(tx);

  let id = s.add_subject(NewSubject::new("Maths", "#111111")).await.unwrap().subject_id;
  assert_eq!(rx.try_recv().unwrap(), StoreEvent::Subjects);

  s.mark_attendance(mark(id, Uuid::new_v4(), AttendanceStatus::Missed, monday()))
    .await
    .unwrap();
  assert_eq!(rx.try_recv().unwrap(), StoreEvent::History);
  assert_eq!(rx.try_recv().unwrap(), StoreEvent::Subjects);

  // Reads announce nothing.
  s.list_subjects().await.unwrap();
  assert!(rx.try_recv().is_err());

  // Failed writes announce nothing either.
  s.add_subject(NewSubject::new("", "#000000")).await.unwrap_err();
  assert!(rx.try_recv().is_err());
}
