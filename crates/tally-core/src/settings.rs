//! User settings. The target percentage is the only field the engine reads;
//! the reminder fields are carried for the notification collaborator.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, session::ClockTime, threshold::DEFAULT_TARGET};

/// Stored user preferences. Missing fields deserialise to their defaults, so
/// partial documents (older snapshots, PATCH-like bodies) are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub notifications_enabled:    bool,
  pub notification_time:        ClockTime,
  pub morning_reminder_enabled: bool,
  pub morning_reminder_time:    ClockTime,
  /// Minimum attendance percentage, exclusive range `(0, 100)`.
  pub target_attendance:        f64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      notifications_enabled:    true,
      notification_time:        ClockTime::new(17, 0).unwrap_or_default(),
      morning_reminder_enabled: false,
      morning_reminder_time:    ClockTime::new(8, 0).unwrap_or_default(),
      target_attendance:        DEFAULT_TARGET,
    }
  }
}

impl Settings {
  pub fn validate(&self) -> Result<()> {
    validate_target(self.target_attendance)
  }
}

/// Reject targets the engine cannot divide by.
pub fn validate_target(target: f64) -> Result<()> {
  if target.is_finite() && target > 0.0 && target < 100.0 {
    Ok(())
  } else {
    Err(Error::InvalidTarget(target))
  }
}
