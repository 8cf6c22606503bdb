//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use tally_core::{
  event::StoreEvent,
  ledger::{LedgerEntry, MarkAttendance, MarkOutcome},
  session::{NewSession, OneOffSession, RecurringSession, Timetable, Weekday},
  settings::Settings,
  snapshot::{SNAPSHOT_VERSION, Snapshot},
  store::AttendanceStore,
  subject::{Counters, NewSubject, Subject, SubjectPatch},
};

use crate::{
  Error, Result,
  encode::{
    ENTRY_COLUMNS, ONE_OFF_COLUMNS, RECURRING_COLUMNS, RawEntry, RawOneOff,
    RawRecurring, RawSnapshot, RawSubject, SUBJECT_COLUMNS, decode_uuid,
    encode_date, encode_uuid, read_counters, write_counters,
  },
  schema::SCHEMA,
};

type RowMapper<T> = fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection is reference-counted and all
/// clones share one outbox.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  outbox: Option<UnboundedSender<StoreEvent>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, outbox: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, as the tests do.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, outbox: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Send a [`StoreEvent`] to `outbox` after every committed mutation.
  pub fn with_outbox(mut self, outbox: UnboundedSender<StoreEvent>) -> Self {
    self.outbox = Some(outbox);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Best effort: a closed outbox never fails the write that preceded it.
  fn emit(&self, events: &[StoreEvent]) {
    let Some(outbox) = &self.outbox else { return };
    for event in events {
      if outbox.send(*event).is_err() {
        tracing::debug!(?event, "outbox closed; dropping store event");
        return;
      }
    }
  }

  /// Run a text-parameter SELECT and map every row.
  async fn query<T: Send + 'static>(
    &self,
    sql: String,
    params: Vec<String>,
    map: RowMapper<T>,
  ) -> Result<Vec<T>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), map)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn subjects_where(
    &self,
    clause: &str,
    params: Vec<String>,
  ) -> Result<Vec<Subject>> {
    let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects {clause} ORDER BY seq");
    let raws = self.query(sql, params, RawSubject::from_row).await?;
    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn recurring_where(
    &self,
    clause: &str,
    params: Vec<String>,
  ) -> Result<Vec<RecurringSession>> {
    let sql = format!(
      "SELECT {RECURRING_COLUMNS} FROM recurring_sessions {clause}"
    );
    let raws = self.query(sql, params, RawRecurring::from_row).await?;
    raws.into_iter().map(RawRecurring::into_session).collect()
  }

  async fn one_offs_where(
    &self,
    clause: &str,
    params: Vec<String>,
  ) -> Result<Vec<OneOffSession>> {
    let sql = format!(
      "SELECT {ONE_OFF_COLUMNS} FROM one_off_sessions {clause} ORDER BY seq"
    );
    let raws = self.query(sql, params, RawOneOff::from_row).await?;
    raws.into_iter().map(RawOneOff::into_session).collect()
  }

  async fn entries_where(
    &self,
    clause: &str,
    params: Vec<String>,
  ) -> Result<Vec<LedgerEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM ledger {clause}");
    let raws = self.query(sql, params, RawEntry::from_row).await?;
    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  /// Delete rows of `table` keyed by `session_id`, with the session's note,
  /// in one transaction. `extra` narrows the match (e.g. by weekday).
  async fn delete_session(
    &self,
    table: &'static str,
    session_id: Uuid,
    extra: Option<(&'static str, String)>,
  ) -> Result<bool> {
    let id_str = encode_uuid(session_id);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = match extra {
          Some((column, value)) => tx.execute(
            &format!("DELETE FROM {table} WHERE session_id = ?1 AND {column} = ?2"),
            rusqlite::params![id_str, value],
          )?,
          None => tx.execute(
            &format!("DELETE FROM {table} WHERE session_id = ?1"),
            rusqlite::params![id_str],
          )?,
        };
        if changed > 0 {
          tx.execute(
            "DELETE FROM notes WHERE session_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(changed > 0)
      })
      .await?;

    Ok(removed)
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

fn insert_subject(conn: &rusqlite::Connection, s: &RawSubject) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO subjects (
       subject_id, name, color, attended, total_held, cancelled, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      s.subject_id,
      s.name,
      s.color,
      s.counters.attended,
      s.counters.total_held,
      s.counters.cancelled,
      s.created_at,
    ],
  )?;
  Ok(())
}

fn insert_recurring(
  conn: &rusqlite::Connection,
  s: &RawRecurring,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO recurring_sessions (
       session_id, weekday, subject_id, start_time, end_time
     ) VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![s.session_id, s.weekday, s.subject_id, s.start_time, s.end_time],
  )?;
  Ok(())
}

fn insert_one_off(conn: &rusqlite::Connection, s: &RawOneOff) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO one_off_sessions (
       session_id, date, subject_id, start_time, end_time, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      s.session_id,
      s.date,
      s.subject_id,
      s.start_time,
      s.end_time,
      s.created_at,
    ],
  )?;
  Ok(())
}

fn insert_entry(conn: &rusqlite::Connection, e: &RawEntry) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO ledger (
       entry_id, session_id, subject_id, status, date, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      e.entry_id,
      e.session_id,
      e.subject_id,
      e.status.as_ref(),
      e.date,
      e.recorded_at,
    ],
  )?;
  Ok(())
}

fn upsert_note(conn: &rusqlite::Connection, session_id: &str, text: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO notes (session_id, text) VALUES (?1, ?2)
     ON CONFLICT (session_id) DO UPDATE SET text = excluded.text",
    rusqlite::params![session_id, text],
  )?;
  Ok(())
}

fn write_settings(conn: &rusqlite::Connection, json: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO settings (id, json) VALUES (1, ?1)
     ON CONFLICT (id) DO UPDATE SET json = excluded.json",
    rusqlite::params![json],
  )?;
  Ok(())
}

/// Empty every table. Children first so foreign keys hold throughout.
fn delete_everything(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "DELETE FROM ledger;
     DELETE FROM notes;
     DELETE FROM recurring_sessions;
     DELETE FROM one_off_sessions;
     DELETE FROM subjects;
     DELETE FROM settings;",
  )
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let input = input.validated()?;
    let subject = Subject {
      subject_id: Uuid::new_v4(),
      name:       input.name,
      color:      input.color,
      counters:   Counters::default(),
      created_at: Utc::now(),
    };

    let raw = RawSubject::from_subject(&subject);
    self
      .conn
      .call(move |conn| {
        insert_subject(conn, &raw)?;
        Ok(())
      })
      .await?;

    self.emit(&[StoreEvent::Subjects]);
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let mut found = self
      .subjects_where("WHERE subject_id = ?1", vec![encode_uuid(id)])
      .await?;
    Ok(found.pop())
  }

  async fn find_subject_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> Result<Option<Subject>> {
    let wanted = name.trim().to_lowercase();
    let subjects = self.list_subjects().await?;
    Ok(subjects.into_iter().find(|s| s.name.to_lowercase() == wanted))
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    self.subjects_where("", vec![]).await
  }

  async fn update_subject(
    &self,
    id:    Uuid,
    patch: SubjectPatch,
  ) -> Result<Option<Subject>> {
    let patch = patch.validated()?;
    let Some(mut subject) = self.get_subject(id).await? else {
      return Ok(None);
    };
    patch.apply_to(&mut subject);

    let id_str = encode_uuid(id);
    let name   = subject.name.clone();
    let color  = subject.color.clone();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET name = ?1, color = ?2 WHERE subject_id = ?3",
          rusqlite::params![name, color, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.emit(&[StoreEvent::Subjects]);
    Ok(Some(subject))
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM ledger WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM notes WHERE session_id IN (
             SELECT session_id FROM recurring_sessions WHERE subject_id = ?1
           )",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM recurring_sessions WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        let changed = tx.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(changed > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(subject_id = %id, "deleted subject with its sessions and history");
      self.emit(&[
        StoreEvent::Subjects,
        StoreEvent::Timetable,
        StoreEvent::History,
        StoreEvent::Notes,
      ]);
    }
    Ok(deleted)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn add_recurring(
    &self,
    weekday: Weekday,
    input:   NewSession,
  ) -> Result<RecurringSession> {
    let session = RecurringSession {
      session_id: Uuid::new_v4(),
      weekday,
      subject_id: input.subject_id,
      start_time: input.start_time,
      end_time:   input.end_time,
    };

    let raw = RawRecurring::from_session(&session);
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if read_counters(&tx, &raw.subject_id)?.is_none() {
          return Ok(false);
        }
        insert_recurring(&tx, &raw)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(tally_core::Error::SubjectNotFound(session.subject_id).into());
    }
    self.emit(&[StoreEvent::Timetable]);
    Ok(session)
  }

  async fn remove_recurring(&self, weekday: Weekday, session_id: Uuid) -> Result<bool> {
    let removed = self
      .delete_session(
        "recurring_sessions",
        session_id,
        Some(("weekday", weekday.as_ref().to_owned())),
      )
      .await?;
    if removed {
      self.emit(&[StoreEvent::Timetable, StoreEvent::Notes]);
    }
    Ok(removed)
  }

  async fn recurring_for(&self, weekday: Weekday) -> Result<Vec<RecurringSession>> {
    self
      .recurring_where(
        "WHERE weekday = ?1 ORDER BY start_time, seq",
        vec![weekday.as_ref().to_owned()],
      )
      .await
  }

  async fn timetable(&self) -> Result<Timetable> {
    let sessions = self.recurring_where("ORDER BY seq", vec![]).await?;
    Ok(Timetable::from_sessions(sessions))
  }

  async fn add_one_off(&self, date: NaiveDate, input: NewSession) -> Result<OneOffSession> {
    let session = OneOffSession {
      session_id: Uuid::new_v4(),
      date,
      subject_id: input.subject_id,
      start_time: input.start_time,
      end_time:   input.end_time,
      created_at: Utc::now(),
    };

    let raw = RawOneOff::from_session(&session);
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if read_counters(&tx, &raw.subject_id)?.is_none() {
          return Ok(false);
        }
        insert_one_off(&tx, &raw)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(tally_core::Error::SubjectNotFound(session.subject_id).into());
    }
    self.emit(&[StoreEvent::OneOffs]);
    Ok(session)
  }

  async fn remove_one_off(&self, session_id: Uuid) -> Result<bool> {
    let removed = self
      .delete_session("one_off_sessions", session_id, None)
      .await?;
    if removed {
      self.emit(&[StoreEvent::OneOffs, StoreEvent::Notes]);
    }
    Ok(removed)
  }

  async fn one_offs_for(&self, date: NaiveDate) -> Result<Vec<OneOffSession>> {
    self
      .one_offs_where("WHERE date = ?1", vec![encode_date(date)])
      .await
  }

  async fn one_offs(&self) -> Result<Vec<OneOffSession>> {
    self.one_offs_where("", vec![]).await
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn set_note(&self, session_id: Uuid, text: String) -> Result<Option<String>> {
    let id_str = encode_uuid(session_id);
    let note = Some(text.trim().to_owned()).filter(|t| !t.is_empty());
    let stored = note.clone();

    self
      .conn
      .call(move |conn| {
        match &stored {
          Some(text) => upsert_note(conn, &id_str, text)?,
          None => {
            conn.execute(
              "DELETE FROM notes WHERE session_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
        }
        Ok(())
      })
      .await?;

    self.emit(&[StoreEvent::Notes]);
    Ok(note)
  }

  async fn note(&self, session_id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(session_id);
    let note = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT text FROM notes WHERE session_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(note)
  }

  async fn notes(&self) -> Result<BTreeMap<Uuid, String>> {
    let rows = self
      .query(
        "SELECT session_id, text FROM notes".to_owned(),
        vec![],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
      )
      .await?;
    rows
      .into_iter()
      .map(|(id, text)| Ok((decode_uuid(&id)?, text)))
      .collect()
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn mark_attendance(&self, input: MarkAttendance) -> Result<MarkOutcome> {
    let entry = LedgerEntry {
      entry_id:    Uuid::new_v4(),
      session_id:  input.session_id,
      subject_id:  input.subject_id,
      status:      input.status,
      date:        input.date,
      recorded_at: Utc::now(),
    };
    let raw = RawEntry::from_entry(&entry);

    // Read, reverse, apply and upsert inside one transaction.
    let outcome: Option<Option<RawEntry>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(mut counters) = read_counters(&tx, &raw.subject_id)? else {
          return Ok(None);
        };

        let prior = tx
          .query_row(
            &format!(
              "SELECT {ENTRY_COLUMNS} FROM ledger WHERE session_id = ?1 AND date = ?2"
            ),
            rusqlite::params![raw.session_id, raw.date],
            RawEntry::from_row,
          )
          .optional()?;

        if let Some(prior) = &prior {
          if prior.subject_id == raw.subject_id {
            counters.reverse(prior.status);
          } else if let Some(mut other) = read_counters(&tx, &prior.subject_id)? {
            other.reverse(prior.status);
            write_counters(&tx, &prior.subject_id, other)?;
          }
        }

        counters.apply(raw.status);
        write_counters(&tx, &raw.subject_id, counters)?;

        if prior.is_some() {
          tx.execute(
            "UPDATE ledger
             SET entry_id = ?1, subject_id = ?2, status = ?3, recorded_at = ?4
             WHERE session_id = ?5 AND date = ?6",
            rusqlite::params![
              raw.entry_id,
              raw.subject_id,
              raw.status.as_ref(),
              raw.recorded_at,
              raw.session_id,
              raw.date,
            ],
          )?;
        } else {
          insert_entry(&tx, &raw)?;
        }

        tx.commit()?;
        Ok(Some(prior))
      })
      .await?;

    let Some(prior) = outcome else {
      return Err(tally_core::Error::SubjectNotFound(entry.subject_id).into());
    };
    let replaced = prior.map(RawEntry::into_entry).transpose()?;

    if let Some(old) = &replaced {
      tracing::debug!(
        session_id = %entry.session_id,
        date = %entry.date,
        from = %old.status,
        to = %entry.status,
        "corrected attendance"
      );
    }

    self.emit(&[StoreEvent::History, StoreEvent::Subjects]);
    Ok(MarkOutcome { entry, replaced })
  }

  async fn history_for_subject(&self, subject_id: Uuid) -> Result<Vec<LedgerEntry>> {
    self
      .entries_where(
        "WHERE subject_id = ?1 ORDER BY date DESC, seq DESC",
        vec![encode_uuid(subject_id)],
      )
      .await
  }

  async fn history_for_date(&self, date: NaiveDate) -> Result<Vec<LedgerEntry>> {
    self
      .entries_where("WHERE date = ?1 ORDER BY seq", vec![encode_date(date)])
      .await
  }

  async fn history(&self) -> Result<Vec<LedgerEntry>> {
    self.entries_where("ORDER BY seq", vec![]).await
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn settings(&self) -> Result<Settings> {
    let json: Option<String> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row("SELECT json FROM settings WHERE id = 1", [], |row| row.get(0))
          .optional()?)
      })
      .await?;

    match json {
      Some(json) => Ok(serde_json::from_str(&json)?),
      None => Ok(Settings::default()),
    }
  }

  async fn update_settings(&self, settings: Settings) -> Result<Settings> {
    settings.validate()?;
    let json = serde_json::to_string(&settings)?;

    self
      .conn
      .call(move |conn| {
        write_settings(conn, &json)?;
        Ok(())
      })
      .await?;

    self.emit(&[StoreEvent::Settings]);
    Ok(settings)
  }

  // ── Bulk ──────────────────────────────────────────────────────────────────

  async fn export_snapshot(&self) -> Result<Snapshot> {
    let raw: RawSnapshot = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let mut raw = RawSnapshot::default();
        {
          let mut stmt = tx.prepare(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY seq"
          ))?;
          raw.subjects = stmt
            .query_map([], RawSubject::from_row)?
            .collect::<rusqlite::Result<_>>()?;

          let mut stmt = tx.prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_sessions ORDER BY seq"
          ))?;
          raw.recurring = stmt
            .query_map([], RawRecurring::from_row)?
            .collect::<rusqlite::Result<_>>()?;

          let mut stmt = tx.prepare(&format!(
            "SELECT {ONE_OFF_COLUMNS} FROM one_off_sessions ORDER BY seq"
          ))?;
          raw.one_offs = stmt
            .query_map([], RawOneOff::from_row)?
            .collect::<rusqlite::Result<_>>()?;

          let mut stmt = tx.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger ORDER BY seq"
          ))?;
          raw.entries = stmt
            .query_map([], RawEntry::from_row)?
            .collect::<rusqlite::Result<_>>()?;

          let mut stmt = tx.prepare("SELECT session_id, text FROM notes")?;
          raw.notes = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

          raw.settings_json = tx
            .query_row("SELECT json FROM settings WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let settings = match raw.settings_json {
      Some(json) => serde_json::from_str(&json)?,
      None => Settings::default(),
    };

    Ok(Snapshot {
      version:            SNAPSHOT_VERSION.to_owned(),
      exported_at:        Some(Utc::now()),
      subjects:           raw
        .subjects
        .into_iter()
        .map(RawSubject::into_subject)
        .collect::<Result<_>>()?,
      recurring_sessions: raw
        .recurring
        .into_iter()
        .map(RawRecurring::into_session)
        .collect::<Result<_>>()?,
      one_off_sessions:   raw
        .one_offs
        .into_iter()
        .map(RawOneOff::into_session)
        .collect::<Result<_>>()?,
      history:            raw
        .entries
        .into_iter()
        .map(RawEntry::into_entry)
        .collect::<Result<_>>()?,
      settings,
      notes:              raw
        .notes
        .into_iter()
        .map(|(id, text)| Ok((decode_uuid(&id)?, text)))
        .collect::<Result<_>>()?,
    })
  }

  async fn import_snapshot(&self, snapshot: Snapshot) -> Result<()> {
    snapshot.validate()?;

    let raw = RawSnapshot {
      subjects:      snapshot.subjects.iter().map(RawSubject::from_subject).collect(),
      recurring:     snapshot
        .recurring_sessions
        .iter()
        .map(RawRecurring::from_session)
        .collect(),
      one_offs:      snapshot
        .one_off_sessions
        .iter()
        .map(RawOneOff::from_session)
        .collect(),
      entries:       snapshot.history.iter().map(RawEntry::from_entry).collect(),
      notes:         snapshot
        .notes
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(id, text)| (encode_uuid(*id), text.trim().to_owned()))
        .collect(),
      settings_json: Some(serde_json::to_string(&snapshot.settings)?),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        delete_everything(&tx)?;
        for s in &raw.subjects {
          insert_subject(&tx, s)?;
        }
        for s in &raw.recurring {
          insert_recurring(&tx, s)?;
        }
        for s in &raw.one_offs {
          insert_one_off(&tx, s)?;
        }
        for e in &raw.entries {
          insert_entry(&tx, e)?;
        }
        for (id, text) in &raw.notes {
          upsert_note(&tx, id, text)?;
        }
        if let Some(json) = &raw.settings_json {
          write_settings(&tx, json)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      subjects = snapshot.subjects.len(),
      entries = snapshot.history.len(),
      "imported snapshot"
    );
    self.emit(&[StoreEvent::Replaced]);
    Ok(())
  }

  async fn clear_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        delete_everything(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.emit(&[StoreEvent::Replaced]);
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Overwrite a subject's counters directly, bypassing the ledger.
  pub(crate) async fn force_counters(&self, id: Uuid, counters: Counters) -> Result<()> {
    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        write_counters(conn, &id_str, counters)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore")
      .field("outbox", &self.outbox.is_some())
      .finish_non_exhaustive()
  }
}
