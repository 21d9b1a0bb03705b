//! Core types and trait definitions for the Carebook care timeline engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod answer;
pub mod error;
pub mod recipient;
pub mod record;
pub mod schedule;
pub mod store;
pub mod template;
pub mod timeline;
pub mod worker;

pub use error::{Error, ErrorKind, Result, StoreError};
