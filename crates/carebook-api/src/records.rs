//! Handlers for `/records` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/records` | `?recipient_id=&template_id=&period=`; `null` when nothing to show |
//! | `GET`  | `/records/history` | `?recipient_id=&template_id=`; newest first |
//! | `POST` | `/records` | 201 when a row was inserted, 200 when one was rewritten |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use carebook_core::{
  answer::Answers,
  record::{AssessmentRecord, NewRecord, Period, RecordLookup, SaveOutcome},
  store::CareStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, ApiQuery};

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LookupParams {
  pub recipient_id: i64,
  pub template_id:  Uuid,
  #[serde(default)]
  pub period:       i64,
}

/// `GET /records?recipient_id=<id>&template_id=<id>[&period=<n>]`
pub async fn lookup<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<LookupParams>,
) -> Result<Json<Option<RecordLookup>>, ApiError> {
  let period = Period::new(params.period).map_err(ApiError::store)?;
  let found = store
    .get_or_carry_forward(params.recipient_id, params.template_id, period)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(found))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub recipient_id: i64,
  pub template_id:  Uuid,
}

/// `GET /records/history?recipient_id=<id>&template_id=<id>`
pub async fn history<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<HistoryParams>,
) -> Result<Json<Vec<AssessmentRecord>>, ApiError> {
  let records = store
    .get_history(params.recipient_id, params.template_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Save ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveBody {
  pub recipient_id: i64,
  pub template_id:  Uuid,
  #[serde(default)]
  pub period:       i64,
  pub answers:      Answers,
  pub record_id:    Option<Uuid>,
}

/// `POST /records`
pub async fn save<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<SaveBody>,
) -> Result<impl IntoResponse, ApiError> {
  let period = Period::new(body.period).map_err(ApiError::store)?;
  let mut input = NewRecord::new(body.recipient_id, body.template_id, period, body.answers);
  if let Some(id) = body.record_id {
    input = input.editing(id);
  }

  let saved = store.save_record(input).await.map_err(ApiError::store)?;
  let status = match saved.outcome {
    SaveOutcome::Created => StatusCode::CREATED,
    SaveOutcome::Updated => StatusCode::OK,
  };
  Ok((status, Json(saved)))
}
