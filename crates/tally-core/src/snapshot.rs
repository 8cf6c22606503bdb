//! Whole-store snapshots for backup, restore and sync.
//!
//! Import is all-or-nothing: [`Snapshot::validate`] runs before a backend
//! touches any state, and backends apply a valid snapshot in one transaction.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  ledger::LedgerEntry,
  session::{OneOffSession, RecurringSession},
  settings::Settings,
  subject::{Counters, Subject},
};

/// The only snapshot format this crate reads and writes.
pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub version:            String,
  #[serde(default)]
  pub exported_at:        Option<DateTime<Utc>>,
  pub subjects:           Vec<Subject>,
  /// Recurring sessions of every weekday, in insertion order.
  pub recurring_sessions: Vec<RecurringSession>,
  #[serde(default)]
  pub one_off_sessions:   Vec<OneOffSession>,
  #[serde(default)]
  pub history:            Vec<LedgerEntry>,
  #[serde(default)]
  pub settings:           Settings,
  #[serde(default)]
  pub notes:              BTreeMap<Uuid, String>,
}

impl Default for Snapshot {
  fn default() -> Self {
    Self {
      version:            SNAPSHOT_VERSION.to_owned(),
      exported_at:        None,
      subjects:           Vec::new(),
      recurring_sessions: Vec::new(),
      one_off_sessions:   Vec::new(),
      history:            Vec::new(),
      settings:           Settings::default(),
      notes:              BTreeMap::new(),
    }
  }
}

impl Snapshot {
  /// Parse and validate a JSON document. A document missing the subject or
  /// session arrays is rejected.
  pub fn from_json(bytes: &[u8]) -> Result<Self> {
    let snapshot: Self = serde_json::from_slice(bytes)
      .map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
    snapshot.validate()?;
    Ok(snapshot)
  }

  pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(self)?)
  }

  /// Check the invariants a store relies on.
  ///
  /// One-off sessions may reference subjects that are gone; recurring
  /// sessions and ledger entries may not.
  pub fn validate(&self) -> Result<()> {
    if self.version != SNAPSHOT_VERSION {
      return Err(Error::UnsupportedSnapshotVersion(self.version.clone()));
    }
    self.settings.validate()?;

    let mut subject_ids = HashSet::new();
    for subject in &self.subjects {
      if !subject_ids.insert(subject.subject_id) {
        return invalid(format!("duplicate subject {}", subject.subject_id));
      }
      if subject.name.trim().is_empty() {
        return invalid(format!("subject {} has no name", subject.subject_id));
      }
      if !subject.counters.is_consistent() {
        return invalid(format!(
          "subject {} attended more sessions than were held",
          subject.subject_id
        ));
      }
    }

    let mut session_ids = HashSet::new();
    for session in &self.recurring_sessions {
      if !session_ids.insert(session.session_id) {
        return invalid(format!("duplicate session {}", session.session_id));
      }
      if !subject_ids.contains(&session.subject_id) {
        return invalid(format!(
          "recurring session {} references unknown subject {}",
          session.session_id, session.subject_id
        ));
      }
    }
    for session in &self.one_off_sessions {
      if !session_ids.insert(session.session_id) {
        return invalid(format!("duplicate session {}", session.session_id));
      }
    }

    let mut marks: HashSet<(Uuid, NaiveDate)> = HashSet::new();
    let mut recorded: HashMap<Uuid, Counters> = HashMap::new();
    for entry in &self.history {
      if !marks.insert((entry.session_id, entry.date)) {
        return invalid(format!(
          "session {} is marked twice on {}",
          entry.session_id, entry.date
        ));
      }
      if !subject_ids.contains(&entry.subject_id) {
        return invalid(format!(
          "ledger entry {} references unknown subject {}",
          entry.entry_id, entry.subject_id
        ));
      }
      recorded.entry(entry.subject_id).or_default().apply(entry.status);
    }

    // Counters must contain their ledger entries: what remains after taking
    // every entry out has to be a consistent, non-negative base.
    for subject in &self.subjects {
      let Some(ledger) = recorded.get(&subject.subject_id) else {
        continue;
      };
      let c = subject.counters;
      let contained = c.attended >= ledger.attended
        && c.total_held >= ledger.total_held
        && c.cancelled >= ledger.cancelled
        && c.attended - ledger.attended <= c.total_held - ledger.total_held;
      if !contained {
        return invalid(format!(
          "subject {} counters disagree with its history",
          subject.subject_id
        ));
      }
    }

    Ok(())
  }
}

fn invalid(message: String) -> Result<()> { Err(Error::InvalidSnapshot(message)) }
