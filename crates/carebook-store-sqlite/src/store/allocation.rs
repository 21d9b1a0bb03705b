//! Workers and recipient allocation.
//!
//! Bulk assignment is a single conditional `UPDATE ... WHERE
//! assigned_worker_id IS NULL`, never a select followed by updates by id.
//! Combined with the `IMMEDIATE` write transaction, two concurrent bulk
//! calls can never hand the same recipient to different workers.

use carebook_core::{
  Error as CoreError, ErrorKind, StoreError as _,
  store::AllocationStore,
  worker::{AllocationSummary, NewWorker, Worker, WorkerSummary},
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawWorker, WORKER_COLUMNS, encode_dt, encode_uuid},
};

use super::SqliteStore;

fn fetch_worker(conn: &Connection, id: Uuid) -> Result<Option<WorkerSummary>> {
  let raw = conn
    .query_row(
      &format!("SELECT {WORKER_COLUMNS} FROM workers w WHERE w.worker_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawWorker::from_row,
    )
    .optional()?;
  raw.map(RawWorker::into_summary).transpose()
}

/// Fail unless `id` names an existing, active worker.
pub(super) fn require_active_worker(conn: &Connection, id: Uuid) -> Result<()> {
  let active: Option<bool> = conn
    .query_row(
      "SELECT active FROM workers WHERE worker_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |r| r.get(0),
    )
    .optional()?;
  match active {
    None => Err(CoreError::WorkerNotFound(id).into()),
    Some(false) => Err(CoreError::WorkerInactive(id).into()),
    Some(true) => Ok(()),
  }
}

impl AllocationStore for SqliteStore {
  // ── Workers ───────────────────────────────────────────────────────────────

  async fn add_worker(&self, input: NewWorker) -> Result<Worker> {
    input.validate()?;

    let worker = Worker {
      worker_id:     Uuid::new_v4(),
      name:          input.name.trim().to_owned(),
      username:      input.username.trim().to_owned(),
      password_hash: input.password_hash,
      contact:       input.contact,
      village:       input.village.map(|v| v.trim().to_owned()),
      active:        true,
      created_at:    Utc::now(),
    };
    let row = worker.clone();

    self
      .write(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM workers WHERE username = ?1",
            rusqlite::params![row.username],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Err(CoreError::DuplicateUsername(row.username).into());
        }

        conn.execute(
          "INSERT INTO workers (
             worker_id, name, username, password_hash, contact, village,
             active, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
          rusqlite::params![
            encode_uuid(row.worker_id),
            row.name,
            row.username,
            row.password_hash,
            row.contact,
            row.village,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(worker_id = %worker.worker_id, username = %worker.username, "worker added");
    Ok(worker)
  }

  async fn get_worker(&self, id: Uuid) -> Result<Option<WorkerSummary>> {
    self.read(move |conn| fetch_worker(conn, id)).await
  }

  async fn list_workers(&self) -> Result<Vec<WorkerSummary>> {
    let raws: Vec<RawWorker> = self
      .read(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {WORKER_COLUMNS} FROM workers w
           ORDER BY w.created_at DESC, w.worker_id ASC"
        ))?;
        let rows = stmt
          .query_map([], RawWorker::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWorker::into_summary).collect()
  }

  async fn set_worker_active(&self, id: Uuid, active: bool) -> Result<Worker> {
    let summary = self
      .write(move |conn| {
        let current = fetch_worker(conn, id)?.ok_or(CoreError::WorkerNotFound(id))?;
        if !active && current.workload > 0 {
          return Err(
            CoreError::WorkerHasLoad { worker_id: id, workload: current.workload }.into(),
          );
        }
        conn.execute(
          "UPDATE workers SET active = ?2 WHERE worker_id = ?1",
          rusqlite::params![encode_uuid(id), active],
        )?;
        Ok(WorkerSummary { worker: Worker { active, ..current.worker }, ..current })
      })
      .await?;

    tracing::info!(worker_id = %id, active, "worker active flag set");
    Ok(summary.worker)
  }

  async fn delete_worker(&self, id: Uuid) -> Result<()> {
    let outcome = self
      .write(move |conn| {
        let current = fetch_worker(conn, id)?.ok_or(CoreError::WorkerNotFound(id))?;
        if current.workload > 0 {
          return Err(
            CoreError::WorkerHasLoad { worker_id: id, workload: current.workload }.into(),
          );
        }
        conn.execute(
          "DELETE FROM workers WHERE worker_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        Ok(())
      })
      .await;

    match &outcome {
      Ok(()) => tracing::info!(worker_id = %id, "worker deleted"),
      Err(e) if e.kind() != ErrorKind::Storage => {
        tracing::info!(worker_id = %id, error = %e, "worker not deleted")
      }
      Err(e) => tracing::error!(worker_id = %id, error = %e, "worker deletion failed"),
    }
    outcome
  }

  // ── Allocation ────────────────────────────────────────────────────────────

  async fn assign_manual(&self, recipient_ids: Vec<i64>, worker_id: Uuid) -> Result<u64> {
    if recipient_ids.is_empty() {
      return Ok(0);
    }
    let ids_json = serde_json::to_string(&recipient_ids)?;

    let count = self
      .write(move |conn| {
        require_active_worker(conn, worker_id)?;
        let changed = conn.execute(
          "UPDATE recipients SET assigned_worker_id = ?1, updated_at = ?2
           WHERE recipient_id IN (SELECT value FROM json_each(?3))",
          rusqlite::params![encode_uuid(worker_id), encode_dt(Utc::now()), ids_json],
        )?;
        Ok(changed as u64)
      })
      .await?;

    tracing::info!(worker_id = %worker_id, count, "recipients assigned by list");
    Ok(count)
  }

  async fn assign_by_village(&self, village: String, worker_id: Uuid) -> Result<u64> {
    let village = village.trim().to_owned();
    if village.is_empty() {
      return Err(CoreError::InvalidInput("village cannot be empty".into()).into());
    }
    let name = village.clone();

    let count = self
      .write(move |conn| {
        require_active_worker(conn, worker_id)?;
        let changed = conn.execute(
          "UPDATE recipients SET assigned_worker_id = ?1, updated_at = ?2
           WHERE assigned_worker_id IS NULL
             AND lower(trim(village)) = lower(?3)",
          rusqlite::params![encode_uuid(worker_id), encode_dt(Utc::now()), village],
        )?;
        if changed == 0 {
          return Err(CoreError::NoUnassignedInVillage(village).into());
        }
        Ok(changed as u64)
      })
      .await?;

    tracing::info!(
      worker_id = %worker_id,
      village = %name,
      count,
      "recipients assigned by village"
    );
    Ok(count)
  }

  async fn assign_by_limit(&self, limit: u32, worker_id: Uuid) -> Result<u64> {
    if limit == 0 {
      return Err(CoreError::InvalidInput("limit must be at least 1".into()).into());
    }

    let count = self
      .write(move |conn| {
        require_active_worker(conn, worker_id)?;
        let changed = conn.execute(
          "UPDATE recipients SET assigned_worker_id = ?1, updated_at = ?2
           WHERE assigned_worker_id IS NULL
             AND recipient_id IN (
               SELECT recipient_id FROM recipients
               WHERE assigned_worker_id IS NULL
               ORDER BY recipient_id ASC
               LIMIT ?3
             )",
          rusqlite::params![encode_uuid(worker_id), encode_dt(Utc::now()), limit],
        )?;
        if changed == 0 {
          return Err(CoreError::NoUnassignedRecipients.into());
        }
        Ok(changed as u64)
      })
      .await?;

    tracing::info!(worker_id = %worker_id, limit, count, "recipients assigned by limit");
    Ok(count)
  }

  async fn allocation_summary(&self) -> Result<AllocationSummary> {
    self
      .read(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(assigned_worker_id IS NULL), 0),
                  COALESCE(SUM(data_complete = 0), 0),
                  COALESCE(SUM(high_risk = 1), 0)
           FROM recipients",
          [],
          |r| {
            Ok(AllocationSummary {
              total:           r.get(0)?,
              unassigned:      r.get(1)?,
              incomplete_data: r.get(2)?,
              high_risk:       r.get(3)?,
            })
          },
        )?)
      })
      .await
  }
}
