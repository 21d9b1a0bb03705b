//! Recipient registry storage.

use carebook_core::{
  Error as CoreError,
  recipient::{CareRecipient, NewRecipient, RecipientQuery, RegistrationSource},
  store::RecipientStore,
  template::Stage,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use super::{SqliteStore, allocation::require_active_worker};
use crate::{
  Result,
  encode::{
    RECIPIENT_COLUMNS, RawRecipient, decode_enum, encode_date, encode_dt, encode_stage,
    encode_uuid,
  },
};

pub(super) fn fetch_recipient(conn: &Connection, id: i64) -> Result<Option<CareRecipient>> {
  let raw = conn
    .query_row(
      &format!("SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE recipient_id = ?1"),
      rusqlite::params![id],
      RawRecipient::from_row,
    )
    .optional()?;
  raw.map(RawRecipient::into_recipient).transpose()
}

impl RecipientStore for SqliteStore {
  async fn register_recipient(&self, input: NewRecipient) -> Result<CareRecipient> {
    input.validate()?;
    let data_complete = input.resolved_data_complete();
    let now = encode_dt(Utc::now());

    let recipient = self
      .write(move |conn| {
        if let Some(external_id) = input.external_id.as_deref() {
          let taken = conn
            .query_row(
              "SELECT 1 FROM recipients WHERE external_id = ?1",
              rusqlite::params![external_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Err(CoreError::DuplicateExternalId(external_id.to_owned()).into());
          }
        }
        if let Some(worker_id) = input.assigned_worker_id {
          require_active_worker(conn, worker_id)?;
        }

        let source: &'static str = input.source.into();
        conn.execute(
          "INSERT INTO recipients (
             external_id, name, age, contact, expected_date, village, stage,
             high_risk, data_complete, source, assigned_worker_id,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
          rusqlite::params![
            input.external_id,
            input.name.trim(),
            input.age,
            input.contact,
            input.expected_date.map(encode_date),
            input.village.as_deref().map(str::trim),
            encode_stage(input.stage),
            input.high_risk,
            data_complete,
            source,
            input.assigned_worker_id.map(encode_uuid),
            now,
          ],
        )?;
        let id = conn.last_insert_rowid();
        fetch_recipient(conn, id)?.ok_or_else(|| CoreError::RecipientNotFound(id).into())
      })
      .await?;

    tracing::info!(
      recipient_id = recipient.recipient_id,
      source = %recipient.source,
      "recipient registered"
    );
    Ok(recipient)
  }

  async fn get_recipient(&self, id: i64) -> Result<Option<CareRecipient>> {
    self.read(move |conn| fetch_recipient(conn, id)).await
  }

  async fn list_recipients<'a>(
    &'a self,
    query: &'a RecipientQuery,
  ) -> Result<Vec<CareRecipient>> {
    let village = query.village.clone();
    let worker = query.assigned_worker_id.map(encode_uuid);
    let unassigned_only = query.unassigned_only;
    let data_complete = query.data_complete;
    let stage = query.stage.map(encode_stage);

    let raws: Vec<RawRecipient> = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECIPIENT_COLUMNS} FROM recipients
           WHERE (?1 IS NULL OR lower(trim(village)) = lower(trim(?1)))
             AND (?2 IS NULL OR assigned_worker_id = ?2)
             AND (?3 = 0 OR assigned_worker_id IS NULL)
             AND (?4 IS NULL OR data_complete = ?4)
             AND (?5 IS NULL OR stage = ?5)
           ORDER BY created_at DESC, recipient_id DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![village, worker, unassigned_only, data_complete, stage],
            RawRecipient::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecipient::into_recipient).collect()
  }

  async fn update_recipient_stage(&self, id: i64, stage: Stage) -> Result<CareRecipient> {
    let recipient = self
      .write(move |conn| {
        let changed = conn.execute(
          "UPDATE recipients SET stage = ?2, updated_at = ?3 WHERE recipient_id = ?1",
          rusqlite::params![id, encode_stage(stage), encode_dt(Utc::now())],
        )?;
        if changed == 0 {
          return Err(CoreError::RecipientNotFound(id).into());
        }
        fetch_recipient(conn, id)?.ok_or_else(|| CoreError::RecipientNotFound(id).into())
      })
      .await?;

    tracing::info!(recipient_id = id, stage = %stage, "recipient stage updated");
    Ok(recipient)
  }

  async fn delete_recipient(&self, id: i64) -> Result<()> {
    self
      .write(move |conn| {
        let source: Option<String> = conn
          .query_row(
            "SELECT source FROM recipients WHERE recipient_id = ?1",
            rusqlite::params![id],
            |r| r.get(0),
          )
          .optional()?;
        let Some(source) = source else {
          return Err(CoreError::RecipientNotFound(id).into());
        };
        if decode_enum::<RegistrationSource>("source", &source)? != RegistrationSource::Manual {
          return Err(
            CoreError::RecipientLocked(id, "only manual registrations can be deleted").into(),
          );
        }

        let history: u64 = conn.query_row(
          "SELECT (SELECT COUNT(*) FROM records   WHERE recipient_id = ?1)
                + (SELECT COUNT(*) FROM schedules WHERE recipient_id = ?1)",
          rusqlite::params![id],
          |r| r.get(0),
        )?;
        if history > 0 {
          return Err(
            CoreError::RecipientLocked(id, "recipient has visit or assessment history").into(),
          );
        }

        conn.execute("DELETE FROM recipients WHERE recipient_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;

    tracing::info!(recipient_id = id, "recipient deleted");
    Ok(())
  }
}
