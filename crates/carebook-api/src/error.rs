//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::{
    FromRequest, FromRequestParts, Path, Query,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use carebook_core::{ErrorKind, StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Wrap a backend or domain error, keeping its category.
  pub fn store<E: StoreError>(e: E) -> Self {
    Self::Store { kind: e.kind(), source: Box::new(e) }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::BadRequest(_) => ErrorKind::Validation,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Store { kind, .. } => *kind,
      Self::Internal(_) => ErrorKind::Storage,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let status = match kind {
      ErrorKind::Validation => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = self.to_string();
    // Not-found and conflict are business outcomes, not faults.
    if kind == ErrorKind::Storage {
      tracing::error!(error = %message, "request failed");
    } else {
      tracing::debug!(error = %message, ?kind, "request rejected");
    }
    (status, Json(json!({ "error": message, "kind": kind }))).into_response()
  }
}

// ─── Extractors ───────────────────────────────────────────────────────────────
//
// Wrappers over axum's extractors so that malformed bodies, query strings and
// path segments all answer with the `{error, kind}` body.

#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
