//! Visit schedules: planned, not-yet-fulfilled obligations.
//!
//! A schedule is created by planning a visit and completed only as a side
//! effect of saving a matching assessment record. "Missed" is never stored;
//! it is derived from the planned date and the reader's clock.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduleStatus {
  Planned,
  Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitSchedule {
  pub schedule_id:    Uuid,
  pub recipient_id:   i64,
  pub template_id:    Uuid,
  pub scheduled_date: NaiveDate,
  pub status:         ScheduleStatus,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl VisitSchedule {
  /// A planned visit whose date is strictly before `today`.
  ///
  /// Two reads on either side of midnight may disagree; that is accepted.
  pub fn is_missed(&self, today: NaiveDate) -> bool {
    self.status == ScheduleStatus::Planned && self.scheduled_date < today
  }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
///
/// Past dates are accepted so that a visit done earlier can be logged after
/// the fact.
pub fn parse_visit_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}
