//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, times of
//! day are zero-padded `HH:MM`, and UUIDs are hyphenated lowercase strings.
//! Enumerations are stored by their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};
use tally_core::{
  ledger::{AttendanceStatus, LedgerEntry},
  session::{ClockTime, OneOffSession, RecurringSession, Weekday},
  subject::{Counters, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: ClockTime) -> String { t.to_string() }

pub fn decode_time(s: &str) -> Result<ClockTime> { Ok(s.parse()?) }

/// Status decoding for use inside a `tokio_rusqlite` call, where only
/// `rusqlite::Error` can be propagated.
pub fn status_column(
  row: &rusqlite::Row<'_>,
  idx: usize,
) -> rusqlite::Result<AttendanceStatus> {
  let text: String = row.get(idx)?;
  AttendanceStatus::parse(&text).map_err(|e| {
    rusqlite::Error::FromSqlConversionFailure(
      idx,
      rusqlite::types::Type::Text,
      Box::new(e),
    )
  })
}

// ─── Subjects ────────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str =
  "subject_id, name, color, attended, total_held, cancelled, created_at";

/// Raw values of a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub color:      String,
  pub counters:   Counters,
  pub created_at: String,
}

impl RawSubject {
  /// Row mapper matching [`SUBJECT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      color:      row.get(2)?,
      counters:   Counters {
        attended:   row.get(3)?,
        total_held: row.get(4)?,
        cancelled:  row.get(5)?,
      },
      created_at: row.get(6)?,
    })
  }

  pub fn from_subject(s: &Subject) -> Self {
    Self {
      subject_id: encode_uuid(s.subject_id),
      name:       s.name.clone(),
      color:      s.color.clone(),
      counters:   s.counters,
      created_at: encode_dt(s.created_at),
    }
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      color:      self.color,
      counters:   self.counters,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Read just the counters of a subject; `None` if it does not exist.
pub fn read_counters(
  conn: &rusqlite::Connection,
  subject_id: &str,
) -> rusqlite::Result<Option<Counters>> {
  use rusqlite::OptionalExtension as _;
  conn
    .query_row(
      "SELECT attended, total_held, cancelled FROM subjects WHERE subject_id = ?1",
      rusqlite::params![subject_id],
      |row| {
        Ok(Counters {
          attended:   row.get(0)?,
          total_held: row.get(1)?,
          cancelled:  row.get(2)?,
        })
      },
    )
    .optional()
}

pub fn write_counters(
  conn: &rusqlite::Connection,
  subject_id: &str,
  c: Counters,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE subjects SET attended = ?1, total_held = ?2, cancelled = ?3
     WHERE subject_id = ?4",
    rusqlite::params![c.attended, c.total_held, c.cancelled, subject_id],
  )?;
  Ok(())
}

// ─── Recurring sessions ──────────────────────────────────────────────────────

pub const RECURRING_COLUMNS: &str =
  "session_id, weekday, subject_id, start_time, end_time";

pub struct RawRecurring {
  pub session_id: String,
  pub weekday:    String,
  pub subject_id: String,
  pub start_time: String,
  pub end_time:   Option<String>,
}

impl RawRecurring {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id: row.get(0)?,
      weekday:    row.get(1)?,
      subject_id: row.get(2)?,
      start_time: row.get(3)?,
      end_time:   row.get(4)?,
    })
  }

  pub fn from_session(s: &RecurringSession) -> Self {
    Self {
      session_id: encode_uuid(s.session_id),
      weekday:    s.weekday.as_ref().to_owned(),
      subject_id: encode_uuid(s.subject_id),
      start_time: encode_time(s.start_time),
      end_time:   s.end_time.map(encode_time),
    }
  }

  pub fn into_session(self) -> Result<RecurringSession> {
    Ok(RecurringSession {
      session_id: decode_uuid(&self.session_id)?,
      weekday:    Weekday::parse(&self.weekday)?,
      subject_id: decode_uuid(&self.subject_id)?,
      start_time: decode_time(&self.start_time)?,
      end_time:   self.end_time.as_deref().map(decode_time).transpose()?,
    })
  }
}

// ─── One-off sessions ────────────────────────────────────────────────────────

pub const ONE_OFF_COLUMNS: &str =
  "session_id, date, subject_id, start_time, end_time, created_at";

pub struct RawOneOff {
  pub session_id: String,
  pub date:       String,
  pub subject_id: String,
  pub start_time: String,
  pub end_time:   Option<String>,
  pub created_at: String,
}

impl RawOneOff {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id: row.get(0)?,
      date:       row.get(1)?,
      subject_id: row.get(2)?,
      start_time: row.get(3)?,
      end_time:   row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn from_session(s: &OneOffSession) -> Self {
    Self {
      session_id: encode_uuid(s.session_id),
      date:       encode_date(s.date),
      subject_id: encode_uuid(s.subject_id),
      start_time: encode_time(s.start_time),
      end_time:   s.end_time.map(encode_time),
      created_at: encode_dt(s.created_at),
    }
  }

  pub fn into_session(self) -> Result<OneOffSession> {
    Ok(OneOffSession {
      session_id: decode_uuid(&self.session_id)?,
      date:       decode_date(&self.date)?,
      subject_id: decode_uuid(&self.subject_id)?,
      start_time: decode_time(&self.start_time)?,
      end_time:   self.end_time.as_deref().map(decode_time).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

pub const ENTRY_COLUMNS: &str =
  "entry_id, session_id, subject_id, status, date, recorded_at";

pub struct RawEntry {
  pub entry_id:    String,
  pub session_id:  String,
  pub subject_id:  String,
  pub status:      AttendanceStatus,
  pub date:        String,
  pub recorded_at: String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:    row.get(0)?,
      session_id:  row.get(1)?,
      subject_id:  row.get(2)?,
      status:      status_column(row, 3)?,
      date:        row.get(4)?,
      recorded_at: row.get(5)?,
    })
  }

  pub fn from_entry(e: &LedgerEntry) -> Self {
    Self {
      entry_id:    encode_uuid(e.entry_id),
      session_id:  encode_uuid(e.session_id),
      subject_id:  encode_uuid(e.subject_id),
      status:      e.status,
      date:        encode_date(e.date),
      recorded_at: encode_dt(e.recorded_at),
    }
  }

  pub fn into_entry(self) -> Result<LedgerEntry> {
    Ok(LedgerEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      session_id:  decode_uuid(&self.session_id)?,
      subject_id:  decode_uuid(&self.subject_id)?,
      status:      self.status,
      date:        decode_date(&self.date)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Every table, read or written in one transaction.
#[derive(Default)]
pub struct RawSnapshot {
  pub subjects:      Vec<RawSubject>,
  pub recurring:     Vec<RawRecurring>,
  pub one_offs:      Vec<RawOneOff>,
  pub entries:       Vec<RawEntry>,
  pub notes:         Vec<(String, String)>,
  pub settings_json: Option<String>,
}
