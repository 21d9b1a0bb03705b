//! [`SqliteStore`], the SQLite implementation of
//! [`CareStore`](carebook_core::store::CareStore).
//!
//! One submodule per component trait. The helpers here are the only places
//! that touch [`tokio_rusqlite::Connection`] directly.

use std::{path::Path, time::Duration};

use carebook_core::{store::Backend, template::FormTemplate};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawTemplate, TEMPLATE_COLUMNS, encode_uuid},
  schema::SCHEMA,
};

mod allocation;
mod recipients;
mod records;
mod schedules;
mod templates;
mod timeline;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A care store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` in a deferred transaction so that every query inside it sees
  /// the same snapshot. Nothing is written, so the transaction is simply
  /// dropped.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Ok(f(&*tx))
      })
      .await?
  }

  /// Run `f` in an `IMMEDIATE` transaction and commit only if it succeeds.
  ///
  /// The write lock is taken up front, so two writers can never both read
  /// the same state and then act on it.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = match f(&*tx) {
          Ok(out) => out,
          Err(e) => return Ok(Err(e)),
        };
        tx.commit()?;
        Ok(Ok(out))
      })
      .await?
  }
}

impl Backend for SqliteStore {
  type Error = crate::Error;
}

// ─── Shared row helpers ──────────────────────────────────────────────────────

fn fetch_template(conn: &Connection, id: Uuid) -> Result<Option<FormTemplate>> {
  let raw = conn
    .query_row(
      &format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE template_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawTemplate::from_row,
    )
    .optional()?;
  raw.map(RawTemplate::into_template).transpose()
}

fn recipient_exists(conn: &Connection, id: i64) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM recipients WHERE recipient_id = ?1",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}
