//! The attendance ledger: outcomes keyed by (session, date) and the effect
//! each outcome has on a subject's counters.
//!
//! [`AttendanceStatus::effect`] is the only place the counter arithmetic is
//! defined. Applying and reversing the same status are exact inverses, except
//! that reversal floors at zero.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, subject::Counters};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The recorded outcome of one session on one date.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
  strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  Attended,
  Missed,
  /// The session did not take place. Neutral for the attendance ratio.
  Cancelled,
}

impl AttendanceStatus {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
  }

  /// Counter increments produced by recording this status.
  pub const fn effect(self) -> Effect {
    match self {
      Self::Attended => Effect { attended: 1, total_held: 1, cancelled: 0 },
      Self::Missed => Effect { attended: 0, total_held: 1, cancelled: 0 },
      Self::Cancelled => Effect { attended: 0, total_held: 0, cancelled: 1 },
    }
  }

  /// Whether the session counts as held.
  pub const fn is_held(self) -> bool { self.effect().total_held > 0 }
}

/// A row of the effect table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
  pub attended:   u32,
  pub total_held: u32,
  pub cancelled:  u32,
}

impl Counters {
  /// Add the effect of `status`.
  pub fn apply(&mut self, status: AttendanceStatus) {
    let e = status.effect();
    self.attended = self.attended.saturating_add(e.attended);
    self.total_held = self.total_held.saturating_add(e.total_held);
    self.cancelled = self.cancelled.saturating_add(e.cancelled);
  }

  /// Undo the effect of `status`, flooring every counter at zero.
  ///
  /// `attended` is then clamped to `total_held`, so counters that did not
  /// actually contain the effect still come out consistent.
  pub fn reverse(&mut self, status: AttendanceStatus) {
    let e = status.effect();
    self.attended = self.attended.saturating_sub(e.attended);
    self.total_held = self.total_held.saturating_sub(e.total_held);
    self.cancelled = self.cancelled.saturating_sub(e.cancelled);
    self.attended = self.attended.min(self.total_held);
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One ledger row. At most one exists per `(session_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
  pub entry_id:    Uuid,
  /// A recurring or one-off session id.
  pub session_id:  Uuid,
  pub subject_id:  Uuid,
  pub status:      AttendanceStatus,
  /// Local calendar date the outcome applies to.
  pub date:        NaiveDate,
  /// When the outcome was recorded; set by the store.
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::AttendanceStore::mark_attendance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkAttendance {
  pub session_id: Uuid,
  pub subject_id: Uuid,
  pub status:     AttendanceStatus,
  pub date:       NaiveDate,
}

/// Outcome of a mark: the stored entry and the one it replaced, if any.
#[derive(Debug, Clone, Serialize)]
pub struct MarkOutcome {
  pub entry:    LedgerEntry,
  pub replaced: Option<LedgerEntry>,
}
