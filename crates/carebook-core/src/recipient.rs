//! Care recipients, the people whose obligations are tracked.
//!
//! A recipient points at its responsible worker; workers never hold a list
//! of recipients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, template::Stage};

/// How the recipient entered the registry.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RegistrationSource {
  /// Bulk-ingested from an external registry.
  #[default]
  Imported,
  /// Registered by hand by a field worker.
  Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareRecipient {
  pub recipient_id:       i64,
  /// Identifier in the external registry; unique when present.
  pub external_id:        Option<String>,
  pub name:               String,
  pub age:                Option<u32>,
  pub contact:            Option<String>,
  /// Expected delivery date, or the equivalent milestone for the stage.
  pub expected_date:      Option<NaiveDate>,
  pub village:            Option<String>,
  pub stage:              Stage,
  pub high_risk:          bool,
  pub data_complete:      bool,
  pub source:             RegistrationSource,
  pub assigned_worker_id: Option<Uuid>,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// Input to [`crate::store::RecipientStore::register_recipient`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipient {
  pub name:               String,
  pub external_id:        Option<String>,
  pub age:                Option<u32>,
  pub contact:            Option<String>,
  pub expected_date:      Option<NaiveDate>,
  pub village:            Option<String>,
  #[serde(default = "default_stage")]
  pub stage:              Stage,
  #[serde(default)]
  pub high_risk:          bool,
  #[serde(default)]
  pub source:             RegistrationSource,
  /// Defaults to `true` for manual registrations and `false` for imports.
  pub data_complete:      Option<bool>,
  pub assigned_worker_id: Option<Uuid>,
}

fn default_stage() -> Stage { Stage::Antenatal }

impl NewRecipient {
  /// A manual antenatal registration with every optional field unset.
  pub fn manual(name: impl Into<String>) -> Self {
    Self {
      name:               name.into(),
      external_id:        None,
      age:                None,
      contact:            None,
      expected_date:      None,
      village:            None,
      stage:              Stage::Antenatal,
      high_risk:          false,
      source:             RegistrationSource::Manual,
      data_complete:      None,
      assigned_worker_id: None,
    }
  }

  pub fn in_village(mut self, village: impl Into<String>) -> Self {
    self.village = Some(village.into());
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidInput("recipient name cannot be empty".into()));
    }
    if self.external_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
      return Err(Error::InvalidInput("external id cannot be blank".into()));
    }
    Ok(())
  }

  pub fn resolved_data_complete(&self) -> bool {
    self
      .data_complete
      .unwrap_or(self.source == RegistrationSource::Manual)
  }
}

/// Filters for [`crate::store::RecipientStore::list_recipients`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipientQuery {
  /// Case-insensitive exact match.
  pub village:            Option<String>,
  pub assigned_worker_id: Option<Uuid>,
  #[serde(default)]
  pub unassigned_only:    bool,
  pub data_complete:      Option<bool>,
  pub stage:              Option<Stage>,
}
