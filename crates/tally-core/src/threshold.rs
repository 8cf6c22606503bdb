//! The threshold engine: closed-form answers to "can I skip the next class?".
//!
//! Every function is pure over `(attended, total_held, target)`, where
//! `target` is a percentage in `(0, 100)`. Range checking of `target` happens
//! where settings are loaded ([`crate::settings::Settings::validate`]); the
//! engine trusts its input. Results are full precision; rounding for display
//! is the caller's business.
//!
//! A subject with nothing held is vacuously safe: 100%, no skip budget, no
//! attend requirement.

use serde::{Deserialize, Serialize};

use crate::subject::Counters;

/// Target used when settings carry none.
pub const DEFAULT_TARGET: f64 = 75.0;

/// Attendance percentage in `[0, 100]`; `100.0` when nothing has been held.
pub fn percentage(attended: u32, total_held: u32) -> f64 {
  if total_held == 0 {
    return 100.0;
  }
  100.0 * f64::from(attended) / f64::from(total_held)
}

/// Largest number of further missed sessions that keeps
/// `attended / (total_held + n) >= target / 100`.
///
/// Solves for `n = attended / (target / 100) - total_held`, floors, and clamps
/// at zero. There is no upper cap: a subject far above target reports its full
/// budget.
pub fn classes_to_skip(attended: u32, total_held: u32, target: f64) -> u32 {
  if total_held == 0 {
    return 0;
  }
  let max_total = 100.0 * f64::from(attended) / target;
  let budget = (max_total - f64::from(total_held)).floor();
  // `as` saturates: negative and NaN become 0.
  budget.max(0.0) as u32
}

/// Smallest number of consecutive attended sessions that lifts the ratio back
/// to `target`, assuming every future session is held.
///
/// Solves `(attended + n) / (total_held + n) = target / 100` for `n`, rounds
/// up, and clamps at zero. Zero whenever the current percentage already meets
/// the target.
pub fn classes_to_attend(attended: u32, total_held: u32, target: f64) -> u32 {
  if percentage(attended, total_held) >= target {
    return 0;
  }
  let shortfall = target * f64::from(total_held) - 100.0 * f64::from(attended);
  let needed = (shortfall / (100.0 - target)).ceil();
  needed.max(0.0) as u32
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Classification of a subject against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdStatus {
  /// At or above target with at least one session to spare.
  Safe { skip_budget: u32 },
  /// At or above target, but the next miss drops below it.
  Warning,
  /// Below target.
  Danger { attend_requirement: u32 },
}

impl ThresholdStatus {
  pub fn is_safe(&self) -> bool { matches!(self, Self::Safe { .. }) }
}

pub fn status(attended: u32, total_held: u32, target: f64) -> ThresholdStatus {
  if percentage(attended, total_held) >= target {
    match classes_to_skip(attended, total_held, target) {
      0 => ThresholdStatus::Warning,
      skip_budget => ThresholdStatus::Safe { skip_budget },
    }
  } else {
    ThresholdStatus::Danger {
      attend_requirement: classes_to_attend(attended, total_held, target),
    }
  }
}

// ─── What-if ─────────────────────────────────────────────────────────────────

/// A hypothetical next session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  /// The session is held and missed.
  Skip,
  /// The session is held and attended.
  Attend,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Simulation {
  pub old_percentage:             f64,
  pub new_percentage:             f64,
  pub dropped:                    bool,
  /// The session would take the subject from at/above target to below it.
  pub crossed_threshold_downward: bool,
}

/// Preview the effect of one more session. Nothing is stored.
pub fn simulate(
  attended: u32,
  total_held: u32,
  action: Action,
  target: f64,
) -> Simulation {
  let (new_attended, new_held) = match action {
    Action::Skip => (attended, total_held.saturating_add(1)),
    Action::Attend => (attended.saturating_add(1), total_held.saturating_add(1)),
  };
  let old_percentage = percentage(attended, total_held);
  let new_percentage = percentage(new_attended, new_held);

  Simulation {
    old_percentage,
    new_percentage,
    dropped: new_percentage < old_percentage,
    crossed_threshold_downward: old_percentage >= target
      && new_percentage < target,
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// Every engine answer for one subject, computed together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Report {
  pub target:            f64,
  pub percentage:        f64,
  pub classes_to_skip:   u32,
  pub classes_to_attend: u32,
  pub status:            ThresholdStatus,
}

impl Report {
  pub fn new(counters: &Counters, target: f64) -> Self {
    let Counters { attended, total_held, .. } = *counters;
    Self {
      target,
      percentage: percentage(attended, total_held),
      classes_to_skip: classes_to_skip(attended, total_held, target),
      classes_to_attend: classes_to_attend(attended, total_held, target),
      status: status(attended, total_held, target),
    }
  }
}
