//! Handlers for visit planning.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/schedules` | Body: `{"recipient_id":1,"template_id":"…","date":"YYYY-MM-DD"}` |
//! | `GET`  | `/recipients/{id}/schedules` | Earliest date first |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use carebook_core::{
  schedule::{VisitSchedule, parse_visit_date},
  store::CareStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, ApiPath};

#[derive(Debug, Deserialize)]
pub struct PlanBody {
  pub recipient_id: i64,
  pub template_id:  Uuid,
  /// Kept as text so a malformed date is reported by the domain validator.
  pub date:         String,
}

/// `POST /schedules`
pub async fn plan<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<PlanBody>,
) -> Result<impl IntoResponse, ApiError> {
  let date = parse_visit_date(&body.date).map_err(ApiError::store)?;
  let schedule = store
    .plan_visit(body.recipient_id, body.template_id, date)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(schedule)))
}

/// `GET /recipients/{id}/schedules`
pub async fn list_for_recipient<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(recipient_id): ApiPath<i64>,
) -> Result<Json<Vec<VisitSchedule>>, ApiError> {
  let schedules = store
    .list_schedules(recipient_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(schedules))
}
