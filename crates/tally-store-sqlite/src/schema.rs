//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every table carries an integer `seq` rowid alias so that insertion order
/// survives export and import.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    seq         INTEGER PRIMARY KEY,
    subject_id  TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    color       TEXT NOT NULL,
    attended    INTEGER NOT NULL DEFAULT 0 CHECK (attended   >= 0),
    total_held  INTEGER NOT NULL DEFAULT 0 CHECK (total_held >= 0),
    cancelled   INTEGER NOT NULL DEFAULT 0 CHECK (cancelled  >= 0),
    created_at  TEXT NOT NULL,
    CHECK (attended <= total_held)
);

CREATE TABLE IF NOT EXISTS recurring_sessions (
    seq         INTEGER PRIMARY KEY,
    session_id  TEXT NOT NULL UNIQUE,
    weekday     TEXT NOT NULL,   -- 'monday' .. 'sunday'
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    start_time  TEXT NOT NULL,   -- zero-padded 'HH:MM'
    end_time    TEXT
);

-- One-off sessions outlive their subject; no foreign key.
CREATE TABLE IF NOT EXISTS one_off_sessions (
    seq         INTEGER PRIMARY KEY,
    session_id  TEXT NOT NULL UNIQUE,
    date        TEXT NOT NULL,   -- local calendar date 'YYYY-MM-DD'
    subject_id  TEXT NOT NULL,
    start_time  TEXT NOT NULL,
    end_time    TEXT,
    created_at  TEXT NOT NULL
);

-- At most one outcome per session per date; corrections update in place.
CREATE TABLE IF NOT EXISTS ledger (
    seq         INTEGER PRIMARY KEY,
    entry_id    TEXT NOT NULL UNIQUE,
    session_id  TEXT NOT NULL,
    subject_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    status      TEXT NOT NULL,   -- 'attended' | 'missed' | 'cancelled'
    date        TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE (session_id, date)
);

CREATE TABLE IF NOT EXISTS notes (
    session_id  TEXT PRIMARY KEY,
    text        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    id          INTEGER PRIMARY KEY CHECK (id = 1),
    json        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS recurring_weekday_idx ON recurring_sessions(weekday);
CREATE INDEX IF NOT EXISTS one_off_date_idx      ON one_off_sessions(date);
CREATE INDEX IF NOT EXISTS ledger_subject_idx    ON ledger(subject_id);
CREATE INDEX IF NOT EXISTS ledger_date_idx       ON ledger(date);

PRAGMA user_version = 1;
";
