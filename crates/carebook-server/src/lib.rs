//! HTTP server wiring for Carebook.
//!
//! Mounts the JSON API from `carebook-api` under `/api/v1` and wraps it in
//! request tracing. The binary in `main.rs` supplies configuration and the
//! SQLite store.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use carebook_core::store::CareStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Prefix every API route is nested under.
pub const API_PREFIX: &str = "/api/v1";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CAREBOOK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/carebook/carebook.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level [`Router`] served by the binary.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: CareStore + 'static,
{
  Router::new()
    .nest(API_PREFIX, carebook_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
