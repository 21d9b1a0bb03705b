//! SQLite backend for the care timeline and allocation engines.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-statement write runs in
//! one `IMMEDIATE` transaction, which also serialises concurrent writers
//! across processes sharing the same file.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
