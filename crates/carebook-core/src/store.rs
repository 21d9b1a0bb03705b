//! Storage traits for the care timeline engine.
//!
//! The traits are implemented by storage backends (e.g.
//! `carebook-store-sqlite`). Higher layers (`carebook-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! Each trait covers one component. [`CareStore`] is the union of all of
//! them and is what the HTTP layer asks for.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  StoreError,
  recipient::{CareRecipient, NewRecipient, RecipientQuery},
  record::{AssessmentRecord, NewRecord, Period, RecordLookup, SavedRecord},
  schedule::VisitSchedule,
  template::{FormTemplate, NewTemplate, Stage, TemplateDeletion},
  timeline::Timeline,
  worker::{AllocationSummary, NewWorker, Worker, WorkerSummary},
};

/// The error type shared by every component trait of a backend.
pub trait Backend: Send + Sync {
  type Error: StoreError;
}

// ─── Form templates ──────────────────────────────────────────────────────────

pub trait TemplateStore: Backend {
  /// Validate and persist a new, active template.
  fn create_template(
    &self,
    input: NewTemplate,
  ) -> impl Future<Output = Result<FormTemplate, Self::Error>> + Send + '_;

  /// Retrieve a template by id, active or not. Returns `None` if not found.
  fn get_template(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FormTemplate>, Self::Error>> + Send + '_;

  /// Active templates of `stage`, optionally narrowed to those that apply
  /// to `period`. Ordered by sort key, then newest first.
  fn list_templates(
    &self,
    stage: Stage,
    period: Option<Period>,
  ) -> impl Future<Output = Result<Vec<FormTemplate>, Self::Error>> + Send + '_;

  /// Every template including inactive ones, in the same order.
  fn list_all_templates(
    &self,
  ) -> impl Future<Output = Result<Vec<FormTemplate>, Self::Error>> + Send + '_;

  /// Flip the active flag and return the updated template.
  fn toggle_template_active(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<FormTemplate, Self::Error>> + Send + '_;

  /// Hard-delete a template and its schedules.
  ///
  /// If records reference the template, fails with a conflict unless
  /// `cascade` is set, in which case the records go in the same
  /// transaction.
  fn delete_template(
    &self,
    id: Uuid,
    cascade: bool,
  ) -> impl Future<Output = Result<TemplateDeletion, Self::Error>> + Send + '_;
}

// ─── Visit schedules ─────────────────────────────────────────────────────────

pub trait ScheduleStore: Backend {
  /// Create the planned visit for the pair, or move the date of the one
  /// that already exists. Never creates a second planned row.
  fn plan_visit(
    &self,
    recipient_id: i64,
    template_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<VisitSchedule, Self::Error>> + Send + '_;

  /// All schedules of a recipient, earliest date first.
  fn list_schedules(
    &self,
    recipient_id: i64,
  ) -> impl Future<Output = Result<Vec<VisitSchedule>, Self::Error>> + Send + '_;

  /// Complete the planned visit for the pair, if any. Returns whether a row
  /// changed. Saving a record does this inside its own transaction.
  fn resolve_schedule(
    &self,
    recipient_id: i64,
    template_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Assessment records ──────────────────────────────────────────────────────

pub trait RecordStore: Backend {
  /// The record for exactly `period`, or for per-period templates the most
  /// recent earlier one as a [`RecordLookup::CarriedForward`] snapshot.
  /// `None` when nothing exists at or before `period`.
  fn get_or_carry_forward(
    &self,
    recipient_id: i64,
    template_id: Uuid,
    period: Period,
  ) -> impl Future<Output = Result<Option<RecordLookup>, Self::Error>> + Send + '_;

  /// Every record of a history template, newest first.
  fn get_history(
    &self,
    recipient_id: i64,
    template_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AssessmentRecord>, Self::Error>> + Send + '_;

  /// Persist answers and complete the matching planned visit atomically.
  fn save_record(
    &self,
    input: NewRecord,
  ) -> impl Future<Output = Result<SavedRecord, Self::Error>> + Send + '_;
}

// ─── Timeline ────────────────────────────────────────────────────────────────

pub trait TimelineStore: Backend {
  /// Recompute the completion matrix from current state. `today` defaults
  /// to the current UTC date.
  fn reconcile_timeline(
    &self,
    recipient_id: i64,
    stage: Stage,
    today: Option<NaiveDate>,
  ) -> impl Future<Output = Result<Timeline, Self::Error>> + Send + '_;
}

// ─── Recipients ──────────────────────────────────────────────────────────────

pub trait RecipientStore: Backend {
  fn register_recipient(
    &self,
    input: NewRecipient,
  ) -> impl Future<Output = Result<CareRecipient, Self::Error>> + Send + '_;

  fn get_recipient(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<CareRecipient>, Self::Error>> + Send + '_;

  /// Recipients matching `query`, newest first.
  fn list_recipients<'a>(
    &'a self,
    query: &'a RecipientQuery,
  ) -> impl Future<Output = Result<Vec<CareRecipient>, Self::Error>> + Send + 'a;

  fn update_recipient_stage(
    &self,
    id: i64,
    stage: Stage,
  ) -> impl Future<Output = Result<CareRecipient, Self::Error>> + Send + '_;

  /// Remove a manually registered recipient that has no history.
  fn delete_recipient(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Workers & allocation ────────────────────────────────────────────────────

pub trait AllocationStore: Backend {
  fn add_worker(
    &self,
    input: NewWorker,
  ) -> impl Future<Output = Result<Worker, Self::Error>> + Send + '_;

  fn get_worker(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<WorkerSummary>, Self::Error>> + Send + '_;

  /// Every worker with its current workload, newest first.
  fn list_workers(
    &self,
  ) -> impl Future<Output = Result<Vec<WorkerSummary>, Self::Error>> + Send + '_;

  /// Deactivating a worker that still has recipients is a conflict.
  fn set_worker_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<Worker, Self::Error>> + Send + '_;

  /// Delete a worker with no assigned recipients.
  fn delete_worker(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Point exactly `recipient_ids` at `worker_id`, overwriting any previous
  /// assignment. Returns the number of recipients updated.
  fn assign_manual(
    &self,
    recipient_ids: Vec<i64>,
    worker_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Assign every unassigned recipient of `village` (case-insensitive).
  /// Fails with not-found when there is none.
  fn assign_by_village(
    &self,
    village: String,
    worker_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Assign up to `limit` unassigned recipients, oldest registration first.
  /// Fails with not-found when none are left.
  fn assign_by_limit(
    &self,
    limit: u32,
    worker_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn allocation_summary(
    &self,
  ) -> impl Future<Output = Result<AllocationSummary, Self::Error>> + Send + '_;
}

// ─── Union ───────────────────────────────────────────────────────────────────

/// Everything the engine exposes, implemented for any backend that provides
/// all of the component traits.
pub trait CareStore:
  TemplateStore
  + ScheduleStore
  + RecordStore
  + TimelineStore
  + RecipientStore
  + AllocationStore
{
}

impl<T> CareStore for T where
  T: TemplateStore
    + ScheduleStore
    + RecordStore
    + TimelineStore
    + RecipientStore
    + AllocationStore
{
}
