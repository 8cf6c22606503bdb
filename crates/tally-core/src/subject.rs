//! Subjects: the courses whose attendance is tracked.
//!
//! The running counters on a subject are owned by the ledger: nothing outside
//! [`crate::ledger`] should change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Running attendance totals for one subject.
///
/// `attended <= total_held` always holds; `cancelled` sessions count towards
/// neither side of the ratio.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct Counters {
  pub attended:   u32,
  pub total_held: u32,
  pub cancelled:  u32,
}

impl Counters {
  pub fn new(attended: u32, total_held: u32) -> Self {
    Self { attended, total_held, cancelled: 0 }
  }

  pub fn is_consistent(&self) -> bool { self.attended <= self.total_held }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub name:       String,
  /// Display colour as supplied by the client (usually a CSS hex string).
  pub color:      String,
  #[serde(flatten)]
  pub counters:   Counters,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::AttendanceStore::add_subject`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:  String,
  pub color: String,
}

impl NewSubject {
  pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
    Self { name: name.into(), color: color.into() }
  }

  /// Trim the name and reject it if nothing is left.
  pub fn validated(self) -> Result<Self> {
    let name = validate_name(&self.name)?;
    Ok(Self { name, color: self.color })
  }
}

/// Partial update for a subject's descriptive fields. Counters are not
/// patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectPatch {
  pub name:  Option<String>,
  pub color: Option<String>,
}

impl SubjectPatch {
  pub fn validated(self) -> Result<Self> {
    let name = self.name.as_deref().map(validate_name).transpose()?;
    Ok(Self { name, color: self.color })
  }

  pub fn apply_to(self, subject: &mut Subject) {
    if let Some(name) = self.name {
      subject.name = name;
    }
    if let Some(color) = self.color {
      subject.color = color;
    }
  }
}

fn validate_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyName);
  }
  Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_names_are_rejected() {
    assert!(matches!(
      NewSubject::new("   ", "#fff").validated(),
      Err(Error::EmptyName)
    ));
    let ok = NewSubject::new("  Physics ", "#fff").validated().unwrap();
    assert_eq!(ok.name, "Physics");
  }

  #[test]
  fn patch_leaves_counters_alone() {
    let mut subject = Subject {
      subject_id: Uuid::nil(),
      name:       "Maths".into(),
      color:      "#000".into(),
      counters:   Counters::new(3, 4),
      created_at: Utc::now(),
    };
    SubjectPatch { name: Some("Algebra".into()), color: None }
      .apply_to(&mut subject);
    assert_eq!(subject.name, "Algebra");
    assert_eq!(subject.color, "#000");
    assert_eq!(subject.counters, Counters::new(3, 4));
  }

  #[test]
  fn counters_flatten_into_subject_json() {
    let subject = Subject {
      subject_id: Uuid::nil(),
      name:       "Maths".into(),
      color:      "#000".into(),
      counters:   Counters::new(3, 4),
      created_at: Utc::now(),
    };
    let json = serde_json::to_value(&subject).unwrap();
    assert_eq!(json["attended"], 3);
    assert_eq!(json["total_held"], 4);
    assert_eq!(json["cancelled"], 0);
  }
}
