//! Assessment record storage: policy-aware saves and carry-forward reads.

use carebook_core::{
  Error as CoreError,
  answer::validate_answers,
  record::{
    AssessmentRecord, CarriedForward, NewRecord, Period, RecordLookup, SaveOutcome,
    SavedRecord,
  },
  store::{RecordStore, TemplateStore},
  template::RecordPolicy,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use super::{SqliteStore, fetch_template, recipient_exists, schedules::complete_planned};
use crate::{
  Result,
  encode::{RECORD_COLUMNS, RawRecord, encode_dt, encode_uuid},
};

fn find_record(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Option<RawRecord>> {
  Ok(conn.query_row(sql, params, RawRecord::from_row).optional()?)
}

impl RecordStore for SqliteStore {
  async fn get_or_carry_forward(
    &self,
    recipient_id: i64,
    template_id: Uuid,
    period: Period,
  ) -> Result<Option<RecordLookup>> {
    let found = self
      .read(move |conn| {
        let template =
          fetch_template(conn, template_id)?.ok_or(CoreError::TemplateNotFound(template_id))?;
        let tid = encode_uuid(template_id);

        let exact = find_record(
          conn,
          &format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE recipient_id = ?1 AND template_id = ?2 AND period = ?3
             ORDER BY updated_at DESC LIMIT 1"
          ),
          rusqlite::params![recipient_id, tid, period.get()],
        )?;
        if let Some(raw) = exact {
          return Ok(Some((raw, false)));
        }
        if template.record_policy() == RecordPolicy::History {
          return Ok(None);
        }

        let earlier = find_record(
          conn,
          &format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE recipient_id = ?1 AND template_id = ?2 AND period < ?3
             ORDER BY period DESC, updated_at DESC LIMIT 1"
          ),
          rusqlite::params![recipient_id, tid, period.get()],
        )?;
        Ok(earlier.map(|raw| (raw, true)))
      })
      .await?;

    let Some((raw, carried)) = found else {
      return Ok(None);
    };
    let record = raw.into_record()?;
    if !carried {
      return Ok(Some(RecordLookup::Live(record)));
    }

    tracing::debug!(
      recipient_id,
      template_id = %template_id,
      period = %period,
      source_period = %record.period,
      "answers carried forward"
    );
    Ok(Some(RecordLookup::CarriedForward(CarriedForward {
      recipient_id,
      template_id,
      period,
      source_period: record.period,
      answers: record.answers,
    })))
  }

  async fn get_history(
    &self,
    recipient_id: i64,
    template_id: Uuid,
  ) -> Result<Vec<AssessmentRecord>> {
    let raws: Vec<RawRecord> = self
      .read(move |conn| {
        let template =
          fetch_template(conn, template_id)?.ok_or(CoreError::TemplateNotFound(template_id))?;
        if template.record_policy() != RecordPolicy::History {
          return Err(
            CoreError::InvalidInput(format!(
              "template {template_id} keeps one record per period and has no history"
            ))
            .into(),
          );
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM records
           WHERE recipient_id = ?1 AND template_id = ?2
           ORDER BY created_at DESC, record_id DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![recipient_id, encode_uuid(template_id)],
            RawRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn save_record(&self, input: NewRecord) -> Result<SavedRecord> {
    let NewRecord { recipient_id, template_id, period, answers, record_id } = input;

    // Validation never reaches the write lock.
    let template = self
      .get_template(template_id)
      .await?
      .ok_or(CoreError::TemplateNotFound(template_id))?;
    validate_answers(&template, &answers)?;
    let policy = template.record_policy();
    let answers_json = serde_json::to_string(&answers)?;

    let saved = self
      .write(move |conn| {
        if !recipient_exists(conn, recipient_id)? {
          return Err(CoreError::RecipientNotFound(recipient_id).into());
        }

        let tid = encode_uuid(template_id);
        let now = encode_dt(Utc::now());

        let existing = match record_id {
          Some(id) => {
            let raw = find_record(
              conn,
              &format!(
                "SELECT {RECORD_COLUMNS} FROM records
                 WHERE record_id = ?1 AND recipient_id = ?2 AND template_id = ?3"
              ),
              rusqlite::params![encode_uuid(id), recipient_id, tid],
            )?;
            Some(raw.ok_or(CoreError::RecordNotFound(id))?)
          }
          None if policy == RecordPolicy::History => None,
          None => find_record(
            conn,
            &format!(
              "SELECT {RECORD_COLUMNS} FROM records
               WHERE recipient_id = ?1 AND template_id = ?2 AND period = ?3
               ORDER BY updated_at DESC LIMIT 1"
            ),
            rusqlite::params![recipient_id, tid, period.get()],
          )?,
        };

        let (outcome, raw) = match existing {
          // Editing by id keeps the row's period.
          Some(prev) => {
            let raw = conn.query_row(
              &format!(
                "UPDATE records SET answers = ?2, updated_at = ?3 WHERE record_id = ?1
                 RETURNING {RECORD_COLUMNS}"
              ),
              rusqlite::params![prev.record_id, answers_json, now],
              RawRecord::from_row,
            )?;
            (SaveOutcome::Updated, raw)
          }
          None => {
            let raw = conn.query_row(
              &format!(
                "INSERT INTO records (
                   record_id, recipient_id, template_id, period, answers,
                   created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 RETURNING {RECORD_COLUMNS}"
              ),
              rusqlite::params![
                encode_uuid(Uuid::new_v4()),
                recipient_id,
                tid,
                period.get(),
                answers_json,
                now,
              ],
              RawRecord::from_row,
            )?;
            (SaveOutcome::Created, raw)
          }
        };

        let resolved_schedule = complete_planned(conn, recipient_id, template_id)?;
        Ok((outcome, raw, resolved_schedule))
      })
      .await?;

    let (outcome, raw, resolved_schedule) = saved;
    let record = raw.into_record()?;

    tracing::info!(
      recipient_id,
      template_id = %template_id,
      record_id = %record.record_id,
      period = %record.period,
      ?outcome,
      resolved_schedule,
      "assessment record saved"
    );
    Ok(SavedRecord { outcome, record, resolved_schedule })
  }
}
