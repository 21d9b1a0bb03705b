//! Handlers for `/recipients` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/recipients` | `?village=&assigned_worker_id=&unassigned_only=&data_complete=&stage=` |
//! | `POST`   | `/recipients` | Body: [`NewRecipient`]; returns 201 |
//! | `GET`    | `/recipients/{id}` | 404 if not found |
//! | `DELETE` | `/recipients/{id}` | Manual registrations without history only; returns 204 |
//! | `PUT`    | `/recipients/{id}/stage` | Body: `{"stage":"postnatal"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use carebook_core::{
  recipient::{CareRecipient, NewRecipient, RecipientQuery},
  store::CareStore,
  template::Stage,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery};

/// `GET /recipients`
pub async fn list<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(query): ApiQuery<RecipientQuery>,
) -> Result<Json<Vec<CareRecipient>>, ApiError> {
  let recipients = store.list_recipients(&query).await.map_err(ApiError::store)?;
  Ok(Json(recipients))
}

/// `POST /recipients`
pub async fn create<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<NewRecipient>,
) -> Result<impl IntoResponse, ApiError> {
  let recipient = store.register_recipient(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(recipient)))
}

/// `GET /recipients/{id}`
pub async fn get_one<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<CareRecipient>, ApiError> {
  let recipient = store
    .get_recipient(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("recipient {id} not found")))?;
  Ok(Json(recipient))
}

/// `DELETE /recipients/{id}`
pub async fn delete<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
  store.delete_recipient(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StageBody {
  pub stage: Stage,
}

/// `PUT /recipients/{id}/stage`
pub async fn update_stage<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<StageBody>,
) -> Result<Json<CareRecipient>, ApiError> {
  let recipient = store
    .update_recipient_stage(id, body.stage)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(recipient))
}
