//! The timeline read model: per-period completion for one recipient.
//!
//! Never stored, always derived: [`reconcile`] is a pure function of the
//! templates, schedules and records handed to it plus the reader's date.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  record::Period,
  schedule::{ScheduleStatus, VisitSchedule},
  template::{FormTemplate, RecordPolicy, Stage},
};

/// The (template, period) coordinates of one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordMark {
  pub template_id: Uuid,
  pub period:      Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
  Done,
  Planned,
  Missed,
  NotStarted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub template_id:  Uuid,
  pub title:        String,
  pub status:       VisitStatus,
  /// Latest planned visit for the template, if one is outstanding.
  pub planned_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTimeline {
  pub period:    Period,
  pub completed: u64,
  pub entries:   Vec<TimelineEntry>,
}

impl PeriodTimeline {
  pub fn is_complete(&self) -> bool {
    !self.entries.is_empty() && self.completed == self.entries.len() as u64
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
  pub recipient_id:       i64,
  pub stage:              Stage,
  /// The date "missed" was judged against.
  pub as_of:              NaiveDate,
  pub periods:            Vec<PeriodTimeline>,
  pub completed:          u64,
  pub total:              u64,
  /// `completed / total` as a whole percentage, rounded half-up; 0 when
  /// there is nothing to do.
  pub completion_percent: u8,
}

/// The periods a stage's timeline is laid out over.
pub fn timeline_periods<'a>(
  stage: Stage,
  templates: impl IntoIterator<Item = &'a FormTemplate>,
) -> BTreeSet<u32> {
  match stage.fixed_periods() {
    Some(range) => range.collect(),
    None => std::iter::once(0)
      .chain(
        templates
          .into_iter()
          .flat_map(|t| t.target_periods.iter().copied()),
      )
      .collect(),
  }
}

/// Build the completion matrix for `recipient_id` in `stage`.
///
/// Inactive templates and templates of other stages are ignored. Periods
/// without any applicable template are left out of the output.
pub fn reconcile(
  recipient_id: i64,
  stage: Stage,
  templates: &[FormTemplate],
  schedules: &[VisitSchedule],
  records: &[RecordMark],
  today: NaiveDate,
) -> Timeline {
  let mut templates: Vec<&FormTemplate> = templates
    .iter()
    .filter(|t| t.active && t.stage == stage)
    .collect();
  templates.sort_by(|a, b| {
    a.sort_order
      .cmp(&b.sort_order)
      .then(b.created_at.cmp(&a.created_at))
      .then(a.template_id.cmp(&b.template_id))
  });

  let mut planned: HashMap<Uuid, NaiveDate> = HashMap::new();
  for s in schedules
    .iter()
    .filter(|s| s.recipient_id == recipient_id && s.status == ScheduleStatus::Planned)
  {
    planned
      .entry(s.template_id)
      .and_modify(|d| *d = (*d).max(s.scheduled_date))
      .or_insert(s.scheduled_date);
  }

  let exact: HashSet<RecordMark> = records.iter().copied().collect();
  let any: HashSet<Uuid> = records.iter().map(|m| m.template_id).collect();

  let mut periods = Vec::new();
  let (mut completed, mut total) = (0u64, 0u64);

  for p in timeline_periods(stage, templates.iter().copied()) {
    let period = Period::from(p);
    let entries: Vec<TimelineEntry> = templates
      .iter()
      .filter(|t| t.applies_to(p))
      .map(|t| {
        let done = match t.record_policy() {
          RecordPolicy::History => any.contains(&t.template_id),
          RecordPolicy::PerPeriod => exact.contains(&RecordMark {
            template_id: t.template_id,
            period,
          }),
        };
        let planned_date = planned.get(&t.template_id).copied();
        let status = match (done, planned_date) {
          (true, _) => VisitStatus::Done,
          (false, Some(d)) if d < today => VisitStatus::Missed,
          (false, Some(_)) => VisitStatus::Planned,
          (false, None) => VisitStatus::NotStarted,
        };
        TimelineEntry {
          template_id: t.template_id,
          title: t.title.clone(),
          status,
          planned_date,
        }
      })
      .collect();

    if entries.is_empty() {
      continue;
    }

    let period_done =
      entries.iter().filter(|e| e.status == VisitStatus::Done).count() as u64;
    completed += period_done;
    total += entries.len() as u64;
    periods.push(PeriodTimeline { period, completed: period_done, entries });
  }

  Timeline {
    recipient_id,
    stage,
    as_of: today,
    periods,
    completed,
    total,
    completion_percent: percent(completed, total),
  }
}

fn percent(done: u64, total: u64) -> u8 {
  if total == 0 {
    return 0;
  }
  // done <= total, so the result is at most 100.
  ((done * 100 + total / 2) / total) as u8
}
