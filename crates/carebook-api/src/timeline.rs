//! Handler for the per-recipient completion timeline.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/recipients/{id}/timeline` | `?stage=` defaults to the recipient's stage; `?as_of=YYYY-MM-DD` defaults to today |
//!
//! Responses carry a strong `ETag` over the serialized matrix, and a
//! matching `If-None-Match` short-circuits to `304 Not Modified`.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use carebook_core::{
  schedule::parse_visit_date,
  store::CareStore,
  template::Stage,
  timeline::Timeline,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{ApiError, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
  pub stage: Option<Stage>,
  pub as_of: Option<String>,
}

/// `GET /recipients/{id}/timeline[?stage=<stage>][&as_of=<date>]`
pub async fn get_one<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(recipient_id): ApiPath<i64>,
  ApiQuery(params): ApiQuery<TimelineParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let today = params
    .as_of
    .as_deref()
    .map(parse_visit_date)
    .transpose()
    .map_err(ApiError::store)?;

  let stage = match params.stage {
    Some(stage) => stage,
    None => {
      store
        .get_recipient(recipient_id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("recipient {recipient_id} not found")))?
        .stage
    }
  };

  let timeline = store
    .reconcile_timeline(recipient_id, stage, today)
    .await
    .map_err(ApiError::store)?;

  let etag = timeline_etag(&timeline)?;
  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }
  Ok(([(header::ETAG, etag)], Json(timeline)).into_response())
}

/// Quoted hex SHA-256 of the timeline's JSON form.
pub fn timeline_etag(timeline: &Timeline) -> Result<HeaderValue, ApiError> {
  let body = serde_json::to_vec(timeline).map_err(|e| ApiError::Internal(e.to_string()))?;
  let hash = Sha256::digest(&body);
  HeaderValue::from_str(&format!("\"{}\"", hex::encode(hash)))
    .map_err(|e| ApiError::Internal(e.to_string()))
}

fn if_none_match(headers: &HeaderMap, etag: &HeaderValue) -> bool {
  let Some(value) = headers.get(header::IF_NONE_MATCH).and_then(|v| v.to_str().ok()) else {
    return false;
  };
  let Ok(etag) = etag.to_str() else {
    return false;
  };
  value
    .split(',')
    .map(str::trim)
    .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}
