//! Handlers for `/workers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/workers` | Each worker with its current workload |
//! | `POST`   | `/workers` | Body: `{"name","username","password",...}`; the password is hashed here |
//! | `GET`    | `/workers/{id}` | 404 if not found |
//! | `DELETE` | `/workers/{id}` | 409 while recipients are assigned; returns 204 |
//! | `PUT`    | `/workers/{id}/active` | Body: `{"active":false}` |

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use carebook_core::{
  store::CareStore,
  worker::{NewWorker, Worker, WorkerSummary},
};
use rand_core::OsRng;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiJson, ApiPath};

/// `GET /workers`
pub async fn list<S: CareStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<WorkerSummary>>, ApiError> {
  let workers = store.list_workers().await.map_err(ApiError::store)?;
  Ok(Json(workers))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:     String,
  pub username: String,
  pub password: String,
  pub contact:  Option<String>,
  pub village:  Option<String>,
}

/// Produce an Argon2id PHC string for `password`.
///
/// Runs on the blocking pool; hashing is deliberately slow.
async fn hash_password(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
  })
  .await
  .map_err(|e| ApiError::Internal(e.to_string()))?
}

/// `POST /workers`
pub async fn create<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password cannot be empty".into()));
  }
  let password_hash = hash_password(body.password).await?;

  let worker = store
    .add_worker(NewWorker {
      name: body.name,
      username: body.username,
      password_hash,
      contact: body.contact,
      village: body.village,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(worker)))
}

// ─── Single worker ────────────────────────────────────────────────────────────

/// `GET /workers/{id}`
pub async fn get_one<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<WorkerSummary>, ApiError> {
  let worker = store
    .get_worker(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("worker {id} not found")))?;
  Ok(Json(worker))
}

/// `DELETE /workers/{id}`
pub async fn delete<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_worker(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `PUT /workers/{id}/active`
pub async fn set_active<S: CareStore>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<ActiveBody>,
) -> Result<Json<Worker>, ApiError> {
  let worker = store
    .set_worker_active(id, body.active)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(worker))
}
