//! Error types for `carebook-core`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Coarse classification shared by every error in the workspace.
///
/// Callers branch on this rather than on concrete variants: only `Storage`
/// is a system fault; the other three are ordinary business outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Storage,
}

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("invalid period {0}: must be a non-negative integer")]
  InvalidPeriod(i64),

  #[error("invalid date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("antenatal templates need at least one target period or the recurring flag")]
  MissingTargetPeriods,

  #[error("invalid template: {0}")]
  InvalidTemplate(String),

  #[error("invalid answer for field {field:?}: {reason}")]
  InvalidAnswer { field: String, reason: String },

  #[error("invalid request: {0}")]
  InvalidInput(String),

  // ── Not found ───────────────────────────────────────────────────────────
  #[error("template not found: {0}")]
  TemplateNotFound(Uuid),

  #[error("recipient not found: {0}")]
  RecipientNotFound(i64),

  #[error("worker not found: {0}")]
  WorkerNotFound(Uuid),

  #[error("assessment record not found: {0}")]
  RecordNotFound(Uuid),

  #[error("no unassigned recipients found in {0}")]
  NoUnassignedInVillage(String),

  #[error("no unassigned recipients left")]
  NoUnassignedRecipients,

  // ── Conflict ────────────────────────────────────────────────────────────
  #[error("worker {worker_id} has active load: reassign {workload} recipient(s) first")]
  WorkerHasLoad { worker_id: Uuid, workload: u64 },

  #[error("worker {0} is inactive")]
  WorkerInactive(Uuid),

  #[error("username {0:?} is already taken")]
  DuplicateUsername(String),

  #[error("external id {0:?} is already registered")]
  DuplicateExternalId(String),

  #[error("template {template_id} is referenced by {records} assessment record(s)")]
  TemplateInUse { template_id: Uuid, records: u64 },

  #[error("recipient {0} cannot be deleted: {1}")]
  RecipientLocked(i64, &'static str),

  // ── Storage ─────────────────────────────────────────────────────────────
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidPeriod(_)
      | Self::InvalidDate(_)
      | Self::MissingTargetPeriods
      | Self::InvalidTemplate(_)
      | Self::InvalidAnswer { .. }
      | Self::InvalidInput(_) => ErrorKind::Validation,

      Self::TemplateNotFound(_)
      | Self::RecipientNotFound(_)
      | Self::WorkerNotFound(_)
      | Self::RecordNotFound(_)
      | Self::NoUnassignedInVillage(_)
      | Self::NoUnassignedRecipients => ErrorKind::NotFound,

      Self::WorkerHasLoad { .. }
      | Self::WorkerInactive(_)
      | Self::DuplicateUsername(_)
      | Self::DuplicateExternalId(_)
      | Self::TemplateInUse { .. }
      | Self::RecipientLocked(..) => ErrorKind::Conflict,

      Self::Serialization(_) => ErrorKind::Storage,
    }
  }

  pub(crate) fn invalid_answer(field: &str, reason: impl Into<String>) -> Self {
    Self::InvalidAnswer { field: field.to_owned(), reason: reason.into() }
  }
}

/// Implemented by every backend error so generic layers (the HTTP API) can
/// map failures to a category without knowing the concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> ErrorKind;
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind { Error::kind(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
