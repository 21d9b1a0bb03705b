//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with fixed microsecond precision so that text
//! order is time order. Calendar dates are `YYYY-MM-DD`. Structured fields
//! (template fields, target periods, answers) are compact JSON. UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr;

use carebook_core::{
  answer::Answers,
  recipient::CareRecipient,
  record::{AssessmentRecord, Period},
  schedule::VisitSchedule,
  template::{FormTemplate, Stage},
  worker::{Worker, WorkerSummary},
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_stage(stage: Stage) -> &'static str { stage.into() }

/// Parse a text column into one of the `strum`-backed domain enums.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Templates ───────────────────────────────────────────────────────────────

pub const TEMPLATE_COLUMNS: &str = "template_id, title, stage, fields, target_periods, \
                                    recurring, active, sort_order, created_at";

/// Raw values read directly from a `templates` row.
pub struct RawTemplate {
  pub template_id:    String,
  pub title:          String,
  pub stage:          String,
  pub fields:         String,
  pub target_periods: String,
  pub recurring:      bool,
  pub active:         bool,
  pub sort_order:     i64,
  pub created_at:     String,
}

impl RawTemplate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      template_id:    row.get(0)?,
      title:          row.get(1)?,
      stage:          row.get(2)?,
      fields:         row.get(3)?,
      target_periods: row.get(4)?,
      recurring:      row.get(5)?,
      active:         row.get(6)?,
      sort_order:     row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_template(self) -> Result<FormTemplate> {
    Ok(FormTemplate {
      template_id:    decode_uuid(&self.template_id)?,
      title:          self.title,
      stage:          decode_enum("stage", &self.stage)?,
      fields:         serde_json::from_str(&self.fields)?,
      target_periods: serde_json::from_str(&self.target_periods)?,
      recurring:      self.recurring,
      active:         self.active,
      sort_order:     self.sort_order,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

// ─── Recipients ──────────────────────────────────────────────────────────────

pub const RECIPIENT_COLUMNS: &str = "recipient_id, external_id, name, age, contact, \
                                     expected_date, village, stage, high_risk, \
                                     data_complete, source, assigned_worker_id, \
                                     created_at, updated_at";

/// Raw values read directly from a `recipients` row.
pub struct RawRecipient {
  pub recipient_id:       i64,
  pub external_id:        Option<String>,
  pub name:               String,
  pub age:                Option<u32>,
  pub contact:            Option<String>,
  pub expected_date:      Option<String>,
  pub village:            Option<String>,
  pub stage:              String,
  pub high_risk:          bool,
  pub data_complete:      bool,
  pub source:             String,
  pub assigned_worker_id: Option<String>,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawRecipient {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recipient_id:       row.get(0)?,
      external_id:        row.get(1)?,
      name:               row.get(2)?,
      age:                row.get(3)?,
      contact:            row.get(4)?,
      expected_date:      row.get(5)?,
      village:            row.get(6)?,
      stage:              row.get(7)?,
      high_risk:          row.get(8)?,
      data_complete:      row.get(9)?,
      source:             row.get(10)?,
      assigned_worker_id: row.get(11)?,
      created_at:         row.get(12)?,
      updated_at:         row.get(13)?,
    })
  }

  pub fn into_recipient(self) -> Result<CareRecipient> {
    Ok(CareRecipient {
      recipient_id:       self.recipient_id,
      external_id:        self.external_id,
      name:               self.name,
      age:                self.age,
      contact:            self.contact,
      expected_date:      self.expected_date.as_deref().map(decode_date).transpose()?,
      village:            self.village,
      stage:              decode_enum("stage", &self.stage)?,
      high_risk:          self.high_risk,
      data_complete:      self.data_complete,
      source:             decode_enum("source", &self.source)?,
      assigned_worker_id: self.assigned_worker_id.as_deref().map(decode_uuid).transpose()?,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Workers ─────────────────────────────────────────────────────────────────

/// Worker columns plus the derived workload, selected from `workers w`.
pub const WORKER_COLUMNS: &str = "w.worker_id, w.name, w.username, w.password_hash, \
                                  w.contact, w.village, w.active, w.created_at, \
                                  (SELECT COUNT(*) FROM recipients r \
                                    WHERE r.assigned_worker_id = w.worker_id)";

pub struct RawWorker {
  pub worker_id:     String,
  pub name:          String,
  pub username:      String,
  pub password_hash: String,
  pub contact:       Option<String>,
  pub village:       Option<String>,
  pub active:        bool,
  pub created_at:    String,
  pub workload:      u64,
}

impl RawWorker {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      worker_id:     row.get(0)?,
      name:          row.get(1)?,
      username:      row.get(2)?,
      password_hash: row.get(3)?,
      contact:       row.get(4)?,
      village:       row.get(5)?,
      active:        row.get(6)?,
      created_at:    row.get(7)?,
      workload:      row.get(8)?,
    })
  }

  pub fn into_summary(self) -> Result<WorkerSummary> {
    Ok(WorkerSummary {
      worker:   Worker {
        worker_id:     decode_uuid(&self.worker_id)?,
        name:          self.name,
        username:      self.username,
        password_hash: self.password_hash,
        contact:       self.contact,
        village:       self.village,
        active:        self.active,
        created_at:    decode_dt(&self.created_at)?,
      },
      workload: self.workload,
    })
  }
}

// ─── Schedules ───────────────────────────────────────────────────────────────

pub const SCHEDULE_COLUMNS: &str = "schedule_id, recipient_id, template_id, scheduled_date, \
                                    status, created_at, updated_at";

pub struct RawSchedule {
  pub schedule_id:    String,
  pub recipient_id:   i64,
  pub template_id:    String,
  pub scheduled_date: String,
  pub status:         String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawSchedule {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      schedule_id:    row.get(0)?,
      recipient_id:   row.get(1)?,
      template_id:    row.get(2)?,
      scheduled_date: row.get(3)?,
      status:         row.get(4)?,
      created_at:     row.get(5)?,
      updated_at:     row.get(6)?,
    })
  }

  pub fn into_schedule(self) -> Result<VisitSchedule> {
    Ok(VisitSchedule {
      schedule_id:    decode_uuid(&self.schedule_id)?,
      recipient_id:   self.recipient_id,
      template_id:    decode_uuid(&self.template_id)?,
      scheduled_date: decode_date(&self.scheduled_date)?,
      status:         decode_enum("status", &self.status)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

pub const RECORD_COLUMNS: &str = "record_id, recipient_id, template_id, period, answers, \
                                  created_at, updated_at";

pub struct RawRecord {
  pub record_id:    String,
  pub recipient_id: i64,
  pub template_id:  String,
  pub period:       u32,
  pub answers:      String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:    row.get(0)?,
      recipient_id: row.get(1)?,
      template_id:  row.get(2)?,
      period:       row.get(3)?,
      answers:      row.get(4)?,
      created_at:   row.get(5)?,
      updated_at:   row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<AssessmentRecord> {
    let answers: Answers = serde_json::from_str(&self.answers)?;
    Ok(AssessmentRecord {
      record_id: decode_uuid(&self.record_id)?,
      recipient_id: self.recipient_id,
      template_id: decode_uuid(&self.template_id)?,
      period: Period::from(self.period),
      answers,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
