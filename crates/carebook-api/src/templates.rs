//! Handlers for `/templates` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/templates` | `?stage=` lists active templates of a stage, optionally `&period=`; no stage lists everything |
//! | `POST`   | `/templates` | Body: [`NewTemplate`]; returns 201 |
//! | `GET`    | `/templates/{id}` | 404 if not found |
//! | `DELETE` | `/templates/{id}` | `?cascade=true` also deletes its records |
//! | `POST`   | `/templates/{id}/toggle` | Flips the active flag |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use carebook_core::{
  record::Period,
  store::CareStore,
  template::{FormTemplate, NewTemplate, Stage, TemplateDeletion},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub stage:  Option<Stage>,
  pub period: Option<i64>,
}

/// `GET /templates[?stage=<stage>[&period=<n>]]`
pub async fn list<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<FormTemplate>>, ApiError> {
  let templates = match params.stage {
    Some(stage) => {
      let period = params.period.map(Period::new).transpose().map_err(ApiError::store)?;
      store.list_templates(stage, period).await
    }
    None if params.period.is_some() => {
      return Err(ApiError::BadRequest("period filter requires a stage".into()));
    }
    None => store.list_all_templates().await,
  }
  .map_err(ApiError::store)?;
  Ok(Json(templates))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /templates`
pub async fn create<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<NewTemplate>,
) -> Result<impl IntoResponse, ApiError> {
  let template = store.create_template(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(template)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /templates/{id}`
pub async fn get_one<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FormTemplate>, ApiError> {
  let template = store
    .get_template(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("template {id} not found")))?;
  Ok(Json(template))
}

// ─── Toggle ───────────────────────────────────────────────────────────────────

/// `POST /templates/{id}/toggle`
pub async fn toggle<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FormTemplate>, ApiError> {
  let template = store.toggle_template_active(id).await.map_err(ApiError::store)?;
  Ok(Json(template))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  #[serde(default)]
  pub cascade: bool,
}

/// `DELETE /templates/{id}[?cascade=true]`
pub async fn delete<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(params): ApiQuery<DeleteParams>,
) -> Result<Json<TemplateDeletion>, ApiError> {
  let deletion = store
    .delete_template(id, params.cascade)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(deletion))
}
