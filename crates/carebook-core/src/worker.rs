//! Field workers and the allocation read models built around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
  pub worker_id:     Uuid,
  pub name:          String,
  pub username:      String,
  /// Argon2 PHC string; never the plain password.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub contact:       Option<String>,
  pub village:       Option<String>,
  pub active:        bool,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AllocationStore::add_worker`].
#[derive(Debug, Clone)]
pub struct NewWorker {
  pub name:          String,
  pub username:      String,
  pub password_hash: String,
  pub contact:       Option<String>,
  pub village:       Option<String>,
}

impl NewWorker {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::InvalidInput("worker name cannot be empty".into()));
    }
    if self.username.trim().is_empty() {
      return Err(Error::InvalidInput("username cannot be empty".into()));
    }
    if self.password_hash.is_empty() {
      return Err(Error::InvalidInput("password hash cannot be empty".into()));
    }
    Ok(())
  }
}

/// A worker together with its derived workload.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSummary {
  #[serde(flatten)]
  pub worker:   Worker,
  /// Number of recipients currently assigned; computed, never stored.
  pub workload: u64,
}

/// Dashboard counters over the whole recipient registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
  pub total:           u64,
  pub unassigned:      u64,
  pub incomplete_data: u64,
  pub high_risk:       u64,
}
