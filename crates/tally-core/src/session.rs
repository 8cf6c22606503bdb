//! Scheduled sessions: the recurring weekly template and one-off extras.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveTime, Timelike as _, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator as _};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Weekday ─────────────────────────────────────────────────────────────────

/// A bucket of the weekly template. Ordered Monday first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumIter,
  EnumString,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Weekday {
  Monday,
  Tuesday,
  Wednesday,
  Thursday,
  Friday,
  Saturday,
  Sunday,
}

impl Weekday {
  /// The weekday a calendar date falls on.
  pub fn of(date: NaiveDate) -> Self { date.weekday().into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownWeekday(s.to_owned()))
  }

  /// The weekday `days` after this one.
  pub fn plus(self, days: u32) -> Self {
    let index = Self::iter().position(|d| d == self).unwrap_or(0);
    Self::iter()
      .cycle()
      .nth(index + days as usize % 7)
      .unwrap_or(self)
  }
}

impl From<chrono::Weekday> for Weekday {
  fn from(w: chrono::Weekday) -> Self {
    match w {
      chrono::Weekday::Mon => Self::Monday,
      chrono::Weekday::Tue => Self::Tuesday,
      chrono::Weekday::Wed => Self::Wednesday,
      chrono::Weekday::Thu => Self::Thursday,
      chrono::Weekday::Fri => Self::Friday,
      chrono::Weekday::Sat => Self::Saturday,
      chrono::Weekday::Sun => Self::Sunday,
    }
  }
}

// ─── ClockTime ───────────────────────────────────────────────────────────────

/// A wall-clock time of day at minute resolution, written `HH:MM`.
///
/// Parsing accepts a single-digit hour (`9:05`); formatting always pads
/// (`09:05`), so the stored text sorts chronologically.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
  hour:   u8,
  minute: u8,
}

impl ClockTime {
  pub fn new(hour: u8, minute: u8) -> Result<Self> {
    if hour > 23 || minute > 59 {
      return Err(Error::InvalidTime(format!("{hour}:{minute}")));
    }
    Ok(Self { hour, minute })
  }

  pub fn hour(&self) -> u8 { self.hour }

  pub fn minute(&self) -> u8 { self.minute }

  /// Truncate a `NaiveTime` to minute resolution.
  pub fn from_time(t: NaiveTime) -> Self {
    Self { hour: t.hour() as u8, minute: t.minute() as u8 }
  }
}

impl FromStr for ClockTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidTime(s.to_owned());
    let (h, m) = s.split_once(':').ok_or_else(invalid)?;

    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if h.is_empty() || h.len() > 2 || m.len() != 2 || !digits(h) || !digits(m)
    {
      return Err(invalid());
    }

    let hour: u8 = h.parse().map_err(|_| invalid())?;
    let minute: u8 = m.parse().map_err(|_| invalid())?;
    Self::new(hour, minute).map_err(|_| invalid())
  }
}

impl fmt::Display for ClockTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}:{:02}", self.hour, self.minute)
  }
}

impl TryFrom<String> for ClockTime {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<ClockTime> for String {
  fn from(t: ClockTime) -> Self { t.to_string() }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// A weekly slot in the template. Holds a non-owning reference to its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSession {
  pub session_id: Uuid,
  pub weekday:    Weekday,
  pub subject_id: Uuid,
  pub start_time: ClockTime,
  pub end_time:   Option<ClockTime>,
}

/// An extra class scheduled on exactly one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneOffSession {
  pub session_id: Uuid,
  pub date:       NaiveDate,
  pub subject_id: Uuid,
  pub start_time: ClockTime,
  pub end_time:   Option<ClockTime>,
  pub created_at: DateTime<Utc>,
}

/// Input to `add_recurring` and `add_one_off`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
  pub subject_id: Uuid,
  pub start_time: ClockTime,
  #[serde(default)]
  pub end_time:   Option<ClockTime>,
}

impl NewSession {
  pub fn new(subject_id: Uuid, start_time: ClockTime) -> Self {
    Self { subject_id, start_time, end_time: None }
  }
}

// ─── Timetable ───────────────────────────────────────────────────────────────

/// The recurring template grouped by weekday.
///
/// Every weekday is present (possibly empty). Within a day, sessions are
/// sorted by start time; ties keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timetable {
  days: BTreeMap<Weekday, Vec<RecurringSession>>,
}

impl Timetable {
  /// Group sessions given in insertion order.
  pub fn from_sessions(
    sessions: impl IntoIterator<Item = RecurringSession>,
  ) -> Self {
    let mut days: BTreeMap<Weekday, Vec<RecurringSession>> =
      Weekday::iter().map(|d| (d, Vec::new())).collect();
    for session in sessions {
      days.entry(session.weekday).or_default().push(session);
    }
    for bucket in days.values_mut() {
      bucket.sort_by_key(|s| s.start_time);
    }
    Self { days }
  }

  pub fn day(&self, weekday: Weekday) -> &[RecurringSession] {
    self.days.get(&weekday).map(Vec::as_slice).unwrap_or_default()
  }

  /// All sessions, Monday first.
  pub fn sessions(&self) -> impl Iterator<Item = &RecurringSession> {
    self.days.values().flatten()
  }
}

impl Default for Timetable {
  fn default() -> Self { Self::from_sessions([]) }
}
