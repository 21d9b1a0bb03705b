//! Schema-free answer payloads and their write-time validation.
//!
//! Storage keeps answers as an opaque JSON object. The shape is checked
//! against the owning template's field list only when a record is saved.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  template::{FieldDef, FieldKind, FormTemplate},
};

/// A single submitted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
  Bool(bool),
  Number(f64),
  Text(String),
  List(Vec<AnswerValue>),
}

impl AnswerValue {
  fn is_blank(&self) -> bool {
    match self {
      Self::Text(s) => s.trim().is_empty(),
      Self::List(items) => items.is_empty(),
      Self::Bool(_) | Self::Number(_) => false,
    }
  }
}

impl From<&str> for AnswerValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<f64> for AnswerValue {
  fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<bool> for AnswerValue {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

/// Field name → submitted value.
pub type Answers = BTreeMap<String, AnswerValue>;

/// Check `answers` against the fields of `template`.
///
/// Unknown keys are rejected, required fields must be present and
/// non-blank, and every present value must fit its field's type. Blank
/// optional values are accepted as-is.
pub fn validate_answers(template: &FormTemplate, answers: &Answers) -> Result<()> {
  if let Some(unknown) = answers.keys().find(|k| template.field(k).is_none()) {
    return Err(Error::invalid_answer(unknown, "not a field of this template"));
  }

  for field in &template.fields {
    match answers.get(&field.name) {
      None => {
        if field.required {
          return Err(Error::invalid_answer(&field.name, "required"));
        }
      }
      Some(value) if value.is_blank() => {
        if field.required {
          return Err(Error::invalid_answer(&field.name, "required"));
        }
      }
      Some(value) => check_value(field, value)?,
    }
  }
  Ok(())
}

fn check_value(field: &FieldDef, value: &AnswerValue) -> Result<()> {
  let name = field.name.as_str();
  match (field.kind, value) {
    (FieldKind::Text, AnswerValue::Text(_)) => Ok(()),
    (FieldKind::Number, AnswerValue::Number(n)) if n.is_finite() => Ok(()),
    (FieldKind::Number, AnswerValue::Text(s)) => s
      .trim()
      .parse::<f64>()
      .ok()
      .filter(|n| n.is_finite())
      .map(|_| ())
      .ok_or_else(|| Error::invalid_answer(name, format!("{s:?} is not a number"))),
    (FieldKind::Select, AnswerValue::Text(s)) => {
      if field.options.iter().any(|o| o == s) {
        Ok(())
      } else {
        Err(Error::invalid_answer(
          name,
          format!("{s:?} is not one of {:?}", field.options),
        ))
      }
    }
    (FieldKind::Date, AnswerValue::Text(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
      .map(|_| ())
      .map_err(|_| Error::invalid_answer(name, format!("{s:?} is not a YYYY-MM-DD date"))),
    (FieldKind::Time, AnswerValue::Text(s)) => NaiveTime::parse_from_str(s, "%H:%M")
      .map(|_| ())
      .map_err(|_| Error::invalid_answer(name, format!("{s:?} is not an HH:MM time"))),
    (FieldKind::Boolean, AnswerValue::Bool(_)) => Ok(()),
    (kind, _) => Err(Error::invalid_answer(
      name,
      format!("expected a {} value", kind_name(kind)),
    )),
  }
}

fn kind_name(kind: FieldKind) -> &'static str {
  match kind {
    FieldKind::Text => "text",
    FieldKind::Number => "number",
    FieldKind::Select => "select",
    FieldKind::Date => "date",
    FieldKind::Time => "time",
    FieldKind::Boolean => "boolean",
  }
}
