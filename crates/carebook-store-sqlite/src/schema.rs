//! SQL schema for the care store.
//!
//! Executed at connection startup; `PRAGMA user_version` records the layout
//! so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS templates (
    template_id    TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    stage          TEXT NOT NULL,            -- 'antenatal' | 'postnatal' | 'child-care'
    fields         TEXT NOT NULL,            -- JSON array of field definitions
    target_periods TEXT NOT NULL DEFAULT '[]',
    recurring      INTEGER NOT NULL DEFAULT 0,
    active         INTEGER NOT NULL DEFAULT 1,
    sort_order     INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workers (
    worker_id     TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    contact       TEXT,
    village       TEXT,
    active        INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recipients (
    recipient_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id        TEXT UNIQUE,
    name               TEXT NOT NULL,
    age                INTEGER,
    contact            TEXT,
    expected_date      TEXT,                 -- YYYY-MM-DD
    village            TEXT,
    stage              TEXT NOT NULL,
    high_risk          INTEGER NOT NULL DEFAULT 0,
    data_complete      INTEGER NOT NULL DEFAULT 0,
    source             TEXT NOT NULL,        -- 'imported' | 'manual'
    assigned_worker_id TEXT REFERENCES workers(worker_id),
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schedules (
    schedule_id    TEXT PRIMARY KEY,
    recipient_id   INTEGER NOT NULL REFERENCES recipients(recipient_id),
    template_id    TEXT NOT NULL REFERENCES templates(template_id),
    scheduled_date TEXT NOT NULL,            -- YYYY-MM-DD
    status         TEXT NOT NULL CHECK (status IN ('planned', 'completed')),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Completed rows accumulate; only the outstanding obligation is unique.
CREATE UNIQUE INDEX IF NOT EXISTS schedules_one_planned_idx
    ON schedules(recipient_id, template_id) WHERE status = 'planned';

CREATE TABLE IF NOT EXISTS records (
    record_id    TEXT PRIMARY KEY,
    recipient_id INTEGER NOT NULL REFERENCES recipients(recipient_id),
    template_id  TEXT NOT NULL REFERENCES templates(template_id),
    period       INTEGER NOT NULL CHECK (period >= 0),
    answers      TEXT NOT NULL,              -- JSON object
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_period_idx  ON records(recipient_id, template_id, period);
CREATE INDEX IF NOT EXISTS records_history_idx ON records(recipient_id, template_id, created_at);
CREATE INDEX IF NOT EXISTS recipients_village_idx ON recipients(village);
CREATE INDEX IF NOT EXISTS recipients_worker_idx  ON recipients(assigned_worker_id);

PRAGMA user_version = 1;
";
