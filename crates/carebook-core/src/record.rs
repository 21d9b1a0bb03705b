//! Assessment records: submitted answers for a (recipient, template) pair.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, answer::Answers};

// ─── Period ──────────────────────────────────────────────────────────────────

/// A discrete unit within a stage; 0 denotes a period-less record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Period(u32);

impl Period {
  pub const NONE: Period = Period(0);

  /// Validate a caller-supplied period number.
  pub fn new(n: i64) -> Result<Self> {
    u32::try_from(n).map(Period).map_err(|_| Error::InvalidPeriod(n))
  }

  pub fn get(self) -> u32 { self.0 }
}

impl From<u32> for Period {
  fn from(n: u32) -> Self { Period(n) }
}

impl fmt::Display for Period {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
  pub record_id:    Uuid,
  pub recipient_id: i64,
  pub template_id:  Uuid,
  pub period:       Period,
  pub answers:      Answers,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// A copy of an earlier period's answers offered as a starting point.
///
/// Carries no record id or timestamps, so it cannot be mistaken for the
/// live record of the requested period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarriedForward {
  pub recipient_id:  i64,
  pub template_id:   Uuid,
  /// The period the caller asked for.
  pub period:        Period,
  /// The earlier period the answers were copied from.
  pub source_period: Period,
  pub answers:       Answers,
}

/// Result of [`crate::store::RecordStore::get_or_carry_forward`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum RecordLookup {
  Live(AssessmentRecord),
  CarriedForward(CarriedForward),
}

impl RecordLookup {
  pub fn is_carried_forward(&self) -> bool {
    matches!(self, Self::CarriedForward(_))
  }

  pub fn answers(&self) -> &Answers {
    match self {
      Self::Live(r) => &r.answers,
      Self::CarriedForward(c) => &c.answers,
    }
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RecordStore::save_record`].
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub recipient_id: i64,
  pub template_id:  Uuid,
  pub period:       Period,
  pub answers:      Answers,
  /// When set, that exact row is edited in place regardless of policy.
  pub record_id:    Option<Uuid>,
}

impl NewRecord {
  pub fn new(
    recipient_id: i64,
    template_id: Uuid,
    period: impl Into<Period>,
    answers: Answers,
  ) -> Self {
    Self {
      recipient_id,
      template_id,
      period: period.into(),
      answers,
      record_id: None,
    }
  }

  pub fn editing(mut self, record_id: Uuid) -> Self {
    self.record_id = Some(record_id);
    self
  }
}

/// Whether a save inserted a new row or rewrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
  Created,
  Updated,
}

/// Result of [`crate::store::RecordStore::save_record`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRecord {
  pub outcome:           SaveOutcome,
  pub record:            AssessmentRecord,
  /// Whether a planned visit was completed by this save.
  pub resolved_schedule: bool,
}
