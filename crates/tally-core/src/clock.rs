//! Injected notion of "now".
//!
//! Attendance is keyed by the user's local calendar date, not the UTC date, so
//! marks made shortly after midnight land on the right day.

use chrono::{Local, NaiveDate, NaiveDateTime};

pub trait Clock: Send + Sync {
  /// Current local date-time.
  fn now(&self) -> NaiveDateTime;

  /// Current local calendar date.
  fn today(&self) -> NaiveDate { self.now().date() }
}

/// Reads the system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> NaiveDateTime { Local::now().naive_local() }
}

/// A clock stuck at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
  fn now(&self) -> NaiveDateTime { self.0 }
}
