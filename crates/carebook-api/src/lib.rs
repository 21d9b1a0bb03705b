//! JSON REST API for Carebook.
//!
//! Exposes an axum [`Router`] backed by any [`carebook_core::store::CareStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", carebook_api::api_router(store.clone()))
//! ```

pub mod allocations;
pub mod error;
pub mod recipients;
pub mod records;
pub mod schedules;
pub mod templates;
pub mod timeline;
pub mod workers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use carebook_core::store::CareStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CareStore + 'static,
{
  Router::new()
    // Templates
    .route("/templates", get(templates::list::<S>).post(templates::create::<S>))
    .route("/templates/{id}", get(templates::get_one::<S>).delete(templates::delete::<S>))
    .route("/templates/{id}/toggle", post(templates::toggle::<S>))
    // Schedules
    .route("/schedules", post(schedules::plan::<S>))
    // Records
    .route("/records", get(records::lookup::<S>).post(records::save::<S>))
    .route("/records/history", get(records::history::<S>))
    // Recipients
    .route("/recipients", get(recipients::list::<S>).post(recipients::create::<S>))
    .route("/recipients/{id}", get(recipients::get_one::<S>).delete(recipients::delete::<S>))
    .route("/recipients/{id}/stage", put(recipients::update_stage::<S>))
    .route("/recipients/{id}/schedules", get(schedules::list_for_recipient::<S>))
    .route("/recipients/{id}/timeline", get(timeline::get_one::<S>))
    // Workers
    .route("/workers", get(workers::list::<S>).post(workers::create::<S>))
    .route("/workers/{id}", get(workers::get_one::<S>).delete(workers::delete::<S>))
    .route("/workers/{id}/active", put(workers::set_active::<S>))
    // Allocations
    .route("/allocations/manual", post(allocations::manual::<S>))
    .route("/allocations/village", post(allocations::village::<S>))
    .route("/allocations/limit", post(allocations::limit::<S>))
    .route("/allocations/summary", get(allocations::summary::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
