//! Form templates, the assessment definitions.
//!
//! A template says *what* to ask (its fields) and *when* it applies (its
//! stage plus either a set of target periods or the recurring flag). Every
//! other component reads templates; only administrators write them.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Stage ───────────────────────────────────────────────────────────────────

/// A phase of the care journey.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  #[strum(to_string = "antenatal")]
  Antenatal,
  #[strum(to_string = "postnatal")]
  Postnatal,
  #[serde(alias = "child_care")]
  #[strum(to_string = "child-care", serialize = "child_care")]
  ChildCare,
}

impl Stage {
  /// The fixed period range of the stage, if it has one.
  ///
  /// Only pregnancy is tracked month by month; the other stages derive their
  /// periods from the templates that target them.
  pub fn fixed_periods(self) -> Option<std::ops::RangeInclusive<u32>> {
    match self {
      Self::Antenatal => Some(1..=9),
      Self::Postnatal | Self::ChildCare => None,
    }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The input type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  Text,
  Number,
  Select,
  /// `YYYY-MM-DD`.
  Date,
  /// `HH:MM`.
  Time,
  Boolean,
}

/// One question in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
  /// Key under which the answer is stored.
  pub name:     String,
  pub label:    String,
  #[serde(rename = "type")]
  pub kind:     FieldKind,
  #[serde(default)]
  pub required: bool,
  /// Allowed values; only meaningful for [`FieldKind::Select`].
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options:  Vec<String>,
}

// ─── Template ────────────────────────────────────────────────────────────────

/// How many assessment records a recipient may hold for a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPolicy {
  /// At most one record per period; saves upsert.
  PerPeriod,
  /// Unbounded append-only history; saves insert unless editing by id.
  History,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTemplate {
  pub template_id:    Uuid,
  pub title:          String,
  pub stage:          Stage,
  pub fields:         Vec<FieldDef>,
  pub target_periods: BTreeSet<u32>,
  pub recurring:      bool,
  pub active:         bool,
  /// Explicit display order; ties fall back to recency.
  pub sort_order:     i64,
  pub created_at:     DateTime<Utc>,
}

impl FormTemplate {
  /// Whether this template should be filled in during `period`.
  ///
  /// Period 0 is the slot for period-less templates.
  pub fn applies_to(&self, period: u32) -> bool {
    self.recurring
      || self.target_periods.contains(&period)
      || (period == 0 && self.target_periods.is_empty())
  }

  pub fn record_policy(&self) -> RecordPolicy {
    if self.recurring || self.stage == Stage::ChildCare {
      RecordPolicy::History
    } else {
      RecordPolicy::PerPeriod
    }
  }

  pub fn field(&self, name: &str) -> Option<&FieldDef> {
    self.fields.iter().find(|f| f.name == name)
  }
}

/// Input to [`crate::store::TemplateStore::create_template`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
  pub title:          String,
  pub stage:          Stage,
  pub fields:         Vec<FieldDef>,
  #[serde(default)]
  pub target_periods: BTreeSet<u32>,
  #[serde(default)]
  pub recurring:      bool,
  #[serde(default)]
  pub sort_order:     i64,
}

impl NewTemplate {
  pub fn new(title: impl Into<String>, stage: Stage, fields: Vec<FieldDef>) -> Self {
    Self {
      title: title.into(),
      stage,
      fields,
      target_periods: BTreeSet::new(),
      recurring: false,
      sort_order: 0,
    }
  }

  pub fn with_periods(mut self, periods: impl IntoIterator<Item = u32>) -> Self {
    self.target_periods = periods.into_iter().collect();
    self
  }

  pub fn recurring(mut self) -> Self {
    self.recurring = true;
    self
  }

  /// Check every structural rule before anything reaches storage.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::InvalidTemplate("title cannot be empty".into()));
    }
    if self.stage == Stage::Antenatal
      && !self.recurring
      && self.target_periods.is_empty()
    {
      return Err(Error::MissingTargetPeriods);
    }
    if let Some(range) = self.stage.fixed_periods()
      && let Some(p) = self.target_periods.iter().find(|p| !range.contains(*p))
    {
      return Err(Error::InvalidTemplate(format!(
        "period {p} is outside {}..={} for {} templates",
        range.start(),
        range.end(),
        self.stage
      )));
    }

    let mut seen = HashSet::new();
    for field in &self.fields {
      if field.name.trim().is_empty() {
        return Err(Error::InvalidTemplate("field names cannot be empty".into()));
      }
      if !seen.insert(field.name.as_str()) {
        return Err(Error::InvalidTemplate(format!(
          "duplicate field name {:?}",
          field.name
        )));
      }
      if field.kind == FieldKind::Select && field.options.is_empty() {
        return Err(Error::InvalidTemplate(format!(
          "select field {:?} has no options",
          field.name
        )));
      }
    }
    Ok(())
  }
}

/// What [`crate::store::TemplateStore::delete_template`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDeletion {
  pub records_deleted:   u64,
  pub schedules_deleted: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(name: &str) -> FieldDef {
    FieldDef {
      name:     name.into(),
      label:    name.into(),
      kind:     FieldKind::Text,
      required: false,
      options:  vec![],
    }
  }

  #[test]
  fn antenatal_needs_periods_or_recurring() {
    let t = NewTemplate::new("Checkup", Stage::Antenatal, vec![text("bp")]);
    assert!(matches!(t.validate(), Err(Error::MissingTargetPeriods)));
    assert!(t.clone().recurring().validate().is_ok());
    assert!(t.with_periods([3]).validate().is_ok());
  }

  #[test]
  fn postnatal_may_be_period_less() {
    let t = NewTemplate::new("PNC visit", Stage::Postnatal, vec![text("notes")]);
    assert!(t.validate().is_ok());
  }

  #[test]
  fn rejects_month_outside_pregnancy() {
    let t = NewTemplate::new("Late", Stage::Antenatal, vec![]).with_periods([10]);
    assert!(matches!(t.validate(), Err(Error::InvalidTemplate(_))));
  }

  #[test]
  fn rejects_duplicate_and_optionless_fields() {
    let dup = NewTemplate::new("Dup", Stage::Postnatal, vec![text("a"), text("a")]);
    assert!(dup.validate().is_err());

    let mut select = text("blood_group");
    select.kind = FieldKind::Select;
    let t = NewTemplate::new("Select", Stage::Postnatal, vec![select]);
    assert!(t.validate().is_err());
  }

  #[test]
  fn stage_text_forms() {
    assert_eq!(Stage::ChildCare.to_string(), "child-care");
    assert_eq!("child_care".parse::<Stage>().unwrap(), Stage::ChildCare);
    let parsed: Stage = serde_json::from_str("\"child-care\"").unwrap();
    assert_eq!(parsed, Stage::ChildCare);
  }

  #[test]
  fn applicability_and_policy() {
    let t = FormTemplate {
      template_id:    Uuid::new_v4(),
      title:          "Month 3".into(),
      stage:          Stage::Antenatal,
      fields:         vec![],
      target_periods: [3, 6].into_iter().collect(),
      recurring:      false,
      active:         true,
      sort_order:     0,
      created_at:     Utc::now(),
    };
    assert!(t.applies_to(3));
    assert!(!t.applies_to(4));
    assert!(!t.applies_to(0));
    assert_eq!(t.record_policy(), RecordPolicy::PerPeriod);

    let child = FormTemplate {
      stage: Stage::ChildCare,
      target_periods: BTreeSet::new(),
      ..t
    };
    assert!(child.applies_to(0));
    assert_eq!(child.record_policy(), RecordPolicy::History);
  }
}
