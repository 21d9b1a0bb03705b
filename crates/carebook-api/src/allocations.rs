//! Handlers for `/allocations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/allocations/manual`  | Body: `{"recipient_ids":[1,2],"worker_id":"…"}` |
//! | `POST` | `/allocations/village` | Body: `{"village":"…","worker_id":"…"}`; unassigned only |
//! | `POST` | `/allocations/limit`   | Body: `{"limit":5,"worker_id":"…"}`; oldest unassigned first |
//! | `GET`  | `/allocations/summary` | Registry counters |
//!
//! Every assignment responds with `{"count": n}`.

use std::sync::Arc;

use axum::{Json, extract::State};
use carebook_core::{store::CareStore, worker::AllocationSummary};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiJson};

#[derive(Debug, Serialize)]
pub struct Assigned {
  pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ManualBody {
  pub recipient_ids: Vec<i64>,
  pub worker_id:     Uuid,
}

/// `POST /allocations/manual`
pub async fn manual<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<ManualBody>,
) -> Result<Json<Assigned>, ApiError> {
  let count = store
    .assign_manual(body.recipient_ids, body.worker_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Assigned { count }))
}

#[derive(Debug, Deserialize)]
pub struct VillageBody {
  pub village:   String,
  pub worker_id: Uuid,
}

/// `POST /allocations/village`
pub async fn village<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<VillageBody>,
) -> Result<Json<Assigned>, ApiError> {
  let count = store
    .assign_by_village(body.village, body.worker_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Assigned { count }))
}

#[derive(Debug, Deserialize)]
pub struct LimitBody {
  pub limit:     u32,
  pub worker_id: Uuid,
}

/// `POST /allocations/limit`
pub async fn limit<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<LimitBody>,
) -> Result<Json<Assigned>, ApiError> {
  let count = store
    .assign_by_limit(body.limit, body.worker_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(Assigned { count }))
}

/// `GET /allocations/summary`
pub async fn summary<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<AllocationSummary>, ApiError> {
  let summary = store.allocation_summary().await.map_err(ApiError::store)?;
  Ok(Json(summary))
}
