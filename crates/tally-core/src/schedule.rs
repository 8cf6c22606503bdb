//! The schedule resolver: what is on for a given date?
//!
//! A date's sessions are the recurring template for its weekday plus the
//! one-off sessions registered for that exact date. Each session is joined to
//! its subject and to the ledger entry for `(session, date)`. Sessions whose
//! subject no longer exists are dropped rather than reported as errors.
//!
//! Ordering is by start time. The sort is stable over the concatenation
//! `recurring ++ one-off`, so on equal start times recurring sessions come
//! first, and within each source insertion order is kept.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  clock::Clock,
  ledger::{AttendanceStatus, LedgerEntry},
  session::{ClockTime, OneOffSession, RecurringSession, Timetable, Weekday},
  store::AttendanceStore,
  subject::Subject,
};

/// A session on a concrete date, annotated for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSession {
  pub session_id: Uuid,
  pub date:       NaiveDate,
  pub subject:    Subject,
  pub start_time: ClockTime,
  pub end_time:   Option<ClockTime>,
  /// `true` for one-off sessions.
  pub is_extra:   bool,
  /// The ledger outcome for this session on `date`; `None` if unmarked.
  pub status:     Option<AttendanceStatus>,
  pub note:       Option<String>,
}

/// Everything the merge needs, already fetched.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleInputs<'a> {
  pub recurring: &'a [RecurringSession],
  pub one_offs:  &'a [OneOffSession],
  pub subjects:  &'a [Subject],
  pub history:   &'a [LedgerEntry],
  pub notes:     &'a BTreeMap<Uuid, String>,
}

/// Union the two sources for `date` and order them.
///
/// `recurring` is taken as-is (the caller picks the weekday bucket);
/// `one_offs` and `history` are filtered to `date` here.
pub fn merge(date: NaiveDate, inputs: ScheduleInputs<'_>) -> Vec<ResolvedSession> {
  let subjects: HashMap<Uuid, &Subject> =
    inputs.subjects.iter().map(|s| (s.subject_id, s)).collect();
  let statuses: HashMap<Uuid, AttendanceStatus> = inputs
    .history
    .iter()
    .filter(|e| e.date == date)
    .map(|e| (e.session_id, e.status))
    .collect();

  let resolve = |session_id: Uuid,
                 subject_id: Uuid,
                 start_time: ClockTime,
                 end_time: Option<ClockTime>,
                 is_extra: bool| {
    let subject = subjects.get(&subject_id)?;
    Some(ResolvedSession {
      session_id,
      date,
      subject: (*subject).clone(),
      start_time,
      end_time,
      is_extra,
      status: statuses.get(&session_id).copied(),
      note: inputs.notes.get(&session_id).cloned(),
    })
  };

  let recurring = inputs.recurring.iter().filter_map(|s| {
    resolve(s.session_id, s.subject_id, s.start_time, s.end_time, false)
  });
  let extras = inputs.one_offs.iter().filter(|s| s.date == date).filter_map(|s| {
    resolve(s.session_id, s.subject_id, s.start_time, s.end_time, true)
  });

  let mut sessions: Vec<ResolvedSession> = recurring.chain(extras).collect();
  sessions.sort_by_key(|s| s.start_time);
  sessions
}

/// Resolve the session list for `date`, whose weekday is `weekday`.
pub async fn sessions_for_date<S: AttendanceStore>(
  store: &S,
  weekday: Weekday,
  date: NaiveDate,
) -> Result<Vec<ResolvedSession>, S::Error> {
  let recurring = store.recurring_for(weekday).await?;
  let one_offs = store.one_offs_for(date).await?;
  let subjects = store.list_subjects().await?;
  let history = store.history_for_date(date).await?;
  let notes = store.notes().await?;

  Ok(merge(date, ScheduleInputs {
    recurring: &recurring,
    one_offs:  &one_offs,
    subjects:  &subjects,
    history:   &history,
    notes:     &notes,
  }))
}

/// [`sessions_for_date`] for the clock's local date.
pub async fn todays_sessions<S: AttendanceStore>(
  store: &S,
  clock: &dyn Clock,
) -> Result<Vec<ResolvedSession>, S::Error> {
  let today = clock.today();
  sessions_for_date(store, Weekday::of(today), today).await
}

// ─── Next class ──────────────────────────────────────────────────────────────

/// The next recurring occurrence of a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextClass {
  pub weekday:       Weekday,
  pub start_time:    ClockTime,
  pub days_from_now: u32,
}

/// Scan today and the following seven days for the subject's next recurring
/// session.
///
/// Sessions today that have already started are skipped, in which case the
/// same weekday a week later is still found. Only the first session of the
/// subject on each day is considered.
pub fn next_class(
  timetable: &Timetable,
  subject_id: Uuid,
  now: NaiveDateTime,
) -> Option<NextClass> {
  let today = Weekday::of(now.date());
  let current = ClockTime::from_time(now.time());

  (0..=7).find_map(|offset| {
    let weekday = today.plus(offset);
    let first = timetable
      .day(weekday)
      .iter()
      .find(|s| s.subject_id == subject_id)?;
    if offset == 0 && first.start_time < current {
      return None;
    }
    Some(NextClass {
      weekday,
      start_time: first.start_time,
      days_from_now: offset,
    })
  })
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::subject::Counters;

  fn subject(name: &str) -> Subject {
    Subject {
      subject_id: Uuid::new_v4(),
      name:       name.into(),
      color:      "#123456".into(),
      counters:   Counters::default(),
      created_at: Utc::now(),
    }
  }

  fn recurring(subject: &Subject, weekday: Weekday, at: &str) -> RecurringSession {
    RecurringSession {
      session_id: Uuid::new_v4(),
      weekday,
      subject_id: subject.subject_id,
      start_time: at.parse().unwrap(),
      end_time: None,
    }
  }

  fn one_off(subject_id: Uuid, date: NaiveDate, at: &str) -> OneOffSession {
    OneOffSession {
      session_id: Uuid::new_v4(),
      date,
      subject_id,
      start_time: at.parse().unwrap(),
      end_time: None,
      created_at: Utc::now(),
    }
  }

  fn monday() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 19).unwrap() }

  #[test]
  fn one_offs_merge_into_recurring_by_time() {
    let a = subject("A");
    let b = subject("B");
    let date = monday();
    let rec = vec![recurring(&a, Weekday::Monday, "09:00")];
    let extra = vec![one_off(b.subject_id, date, "08:00")];

    let merged = merge(date, ScheduleInputs {
      recurring: &rec,
      one_offs:  &extra,
      subjects:  &[a.clone(), b.clone()],
      history:   &[],
      notes:     &BTreeMap::new(),
    });

    let names: Vec<&str> = merged.iter().map(|s| s.subject.name.as_str()).collect();
    assert_eq!(names, ["B", "A"]);
    assert!(merged[0].is_extra);
    assert!(!merged[1].is_extra);
    assert!(merged.iter().all(|s| s.status.is_none()));
  }

  #[test]
  fn ties_put_recurring_first() {
    let a = subject("A");
    let b = subject("B");
    let date = monday();
    let rec = vec![recurring(&a, Weekday::Monday, "10:00")];
    let extra = vec![one_off(b.subject_id, date, "10:00")];

    let merged = merge(date, ScheduleInputs {
      recurring: &rec,
      one_offs:  &extra,
      subjects:  &[a, b],
      history:   &[],
      notes:     &BTreeMap::new(),
    });
    assert_eq!(merged[0].session_id, rec[0].session_id);
    assert_eq!(merged[1].session_id, extra[0].session_id);
  }

  #[test]
  fn orphans_and_other_dates_are_dropped() {
    let a = subject("A");
    let date = monday();
    let rec = vec![recurring(&a, Weekday::Monday, "09:00")];
    let extra = vec![
      one_off(Uuid::new_v4(), date, "11:00"),
      one_off(a.subject_id, date.succ_opt().unwrap(), "12:00"),
    ];

    let merged = merge(date, ScheduleInputs {
      recurring: &rec,
      one_offs:  &extra,
      subjects:  &[a],
      history:   &[],
      notes:     &BTreeMap::new(),
    });
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].session_id, rec[0].session_id);
  }

  #[test]
  fn status_and_note_come_from_the_same_date() {
    let a = subject("A");
    let date = monday();
    let rec = vec![recurring(&a, Weekday::Monday, "09:00")];
    let entry = |date| LedgerEntry {
      entry_id: Uuid::new_v4(),
      session_id: rec[0].session_id,
      subject_id: a.subject_id,
      status: AttendanceStatus::Missed,
      date,
      recorded_at: Utc::now(),
    };
    let last_week = date - chrono::Duration::days(7);
    let notes = BTreeMap::from([(rec[0].session_id, "lab coat".to_string())]);

    let merged = merge(date, ScheduleInputs {
      recurring: &rec,
      one_offs:  &[],
      subjects:  std::slice::from_ref(&a),
      history:   &[entry(last_week)],
      notes:     &notes,
    });
    assert_eq!(merged[0].status, None);
    assert_eq!(merged[0].note.as_deref(), Some("lab coat"));

    let merged = merge(date, ScheduleInputs {
      recurring: &rec,
      one_offs:  &[],
      subjects:  std::slice::from_ref(&a),
      history:   &[entry(last_week), entry(date)],
      notes:     &notes,
    });
    assert_eq!(merged[0].status, Some(AttendanceStatus::Missed));
  }

  #[test]
  fn next_class_skips_sessions_already_started() {
    let a = subject("A");
    let table = Timetable::from_sessions(vec![
      recurring(&a, Weekday::Monday, "09:00"),
      recurring(&a, Weekday::Wednesday, "14:00"),
    ]);

    let before = monday().and_hms_opt(8, 0, 0).unwrap();
    let next = next_class(&table, a.subject_id, before).unwrap();
    assert_eq!(next.weekday, Weekday::Monday);
    assert_eq!(next.days_from_now, 0);

    let after = monday().and_hms_opt(9, 30, 0).unwrap();
    let next = next_class(&table, a.subject_id, after).unwrap();
    assert_eq!(next.weekday, Weekday::Wednesday);
    assert_eq!(next.days_from_now, 2);
    assert_eq!(next.start_time.to_string(), "14:00");

    assert!(next_class(&table, Uuid::new_v4(), before).is_none());
  }

  #[test]
  fn next_class_wraps_the_week() {
    let a = subject("A");
    let table =
      Timetable::from_sessions(vec![recurring(&a, Weekday::Monday, "09:00")]);
    let late_monday = monday().and_hms_opt(18, 0, 0).unwrap();
    let next = next_class(&table, a.subject_id, late_monday).unwrap();
    assert_eq!(next.weekday, Weekday::Monday);
    assert_eq!(next.days_from_now, 7);

    let saturday = (monday() - chrono::Duration::days(2))
      .and_hms_opt(12, 0, 0)
      .unwrap();
    let next = next_class(&table, a.subject_id, saturday).unwrap();
    assert_eq!(next.days_from_now, 2);
  }
}
