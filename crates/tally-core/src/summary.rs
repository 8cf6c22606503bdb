//! Aggregate views built on the threshold engine.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  schedule::ResolvedSession,
  subject::Subject,
  threshold::{self, ThresholdStatus},
};

/// How close to the target counts as "near" for [`Alert::NearThreshold`].
pub const ALERT_MARGIN: f64 = 5.0;

// ─── Overview ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Overview {
  pub total_subjects:     usize,
  /// Subjects at or above the target.
  pub subjects_on_target: usize,
  pub total_held:         u64,
  pub total_attended:     u64,
  /// Attended over held across all subjects; `100.0` when nothing was held.
  pub overall_percentage: f64,
}

pub fn overview(subjects: &[Subject], target: f64) -> Overview {
  let mut total_held = 0u64;
  let mut total_attended = 0u64;
  let mut subjects_on_target = 0;

  for s in subjects {
    total_held += u64::from(s.counters.total_held);
    total_attended += u64::from(s.counters.attended);
    if threshold::percentage(s.counters.attended, s.counters.total_held) >= target
    {
      subjects_on_target += 1;
    }
  }

  let overall_percentage = if total_held == 0 {
    100.0
  } else {
    100.0 * total_attended as f64 / total_held as f64
  };

  Overview {
    total_subjects: subjects.len(),
    subjects_on_target,
    total_held,
    total_attended,
    overall_percentage,
  }
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
  /// At or above target by no more than [`ALERT_MARGIN`] points.
  NearThreshold { margin: f64 },
  /// Below target.
  BelowTarget { classes_to_attend: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAlert {
  pub subject_id: Uuid,
  pub name:       String,
  pub percentage: f64,
  pub alert:      Alert,
}

/// Classify one subject. Subjects with nothing held never alert.
pub fn alert_for(subject: &Subject, target: f64) -> Option<Alert> {
  let c = subject.counters;
  if c.total_held == 0 {
    return None;
  }
  let margin = threshold::percentage(c.attended, c.total_held) - target;
  if margin < 0.0 {
    Some(Alert::BelowTarget {
      classes_to_attend: threshold::classes_to_attend(
        c.attended,
        c.total_held,
        target,
      ),
    })
  } else if margin <= ALERT_MARGIN {
    Some(Alert::NearThreshold { margin })
  } else {
    None
  }
}

pub fn alerts(subjects: &[Subject], target: f64) -> Vec<SubjectAlert> {
  subjects
    .iter()
    .filter_map(|s| {
      let alert = alert_for(s, target)?;
      Some(SubjectAlert {
        subject_id: s.subject_id,
        name: s.name.clone(),
        percentage: threshold::percentage(s.counters.attended, s.counters.total_held),
        alert,
      })
    })
    .collect()
}

// ─── Day verdicts ────────────────────────────────────────────────────────────

/// Whether skipping a subject's session today is affordable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
  pub subject_id: Uuid,
  pub name:       String,
  pub percentage: f64,
  pub status:     ThresholdStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayVerdicts {
  pub verdicts:   Vec<Verdict>,
  /// Subjects whose status is [`ThresholdStatus::Safe`].
  pub safe_count: usize,
}

/// One verdict per distinct subject in `sessions`, in first-appearance order.
pub fn day_verdicts(sessions: &[ResolvedSession], target: f64) -> DayVerdicts {
  let mut seen = HashSet::new();
  let verdicts: Vec<Verdict> = sessions
    .iter()
    .filter(|s| seen.insert(s.subject.subject_id))
    .map(|s| {
      let c = s.subject.counters;
      Verdict {
        subject_id: s.subject.subject_id,
        name:       s.subject.name.clone(),
        percentage: threshold::percentage(c.attended, c.total_held),
        status:     threshold::status(c.attended, c.total_held, target),
      }
    })
    .collect();
  let safe_count = verdicts.iter().filter(|v| v.status.is_safe()).count();
  DayVerdicts { verdicts, safe_count }
}
