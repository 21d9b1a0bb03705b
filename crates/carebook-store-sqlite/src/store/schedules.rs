//! Visit schedule storage.

use carebook_core::{
  Error as CoreError,
  schedule::VisitSchedule,
  store::ScheduleStore,
};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::{SqliteStore, fetch_template, recipient_exists};
use crate::{
  Result,
  encode::{RawSchedule, SCHEDULE_COLUMNS, encode_date, encode_dt, encode_uuid},
};

/// Mark the outstanding visit for the pair completed. Shared with record
/// saves so both happen inside the caller's transaction.
pub(super) fn complete_planned(
  conn: &Connection,
  recipient_id: i64,
  template_id: Uuid,
) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE schedules SET status = 'completed', updated_at = ?3
     WHERE recipient_id = ?1 AND template_id = ?2 AND status = 'planned'",
    rusqlite::params![recipient_id, encode_uuid(template_id), encode_dt(Utc::now())],
  )?;
  Ok(changed > 0)
}

impl ScheduleStore for SqliteStore {
  async fn plan_visit(
    &self,
    recipient_id: i64,
    template_id: Uuid,
    date: NaiveDate,
  ) -> Result<VisitSchedule> {
    let schedule = self
      .write(move |conn| {
        if !recipient_exists(conn, recipient_id)? {
          return Err(CoreError::RecipientNotFound(recipient_id).into());
        }
        if fetch_template(conn, template_id)?.is_none() {
          return Err(CoreError::TemplateNotFound(template_id).into());
        }

        let now = encode_dt(Utc::now());
        // Re-planning moves the existing obligation rather than adding one.
        let raw = conn.query_row(
          &format!(
            "INSERT INTO schedules (
               schedule_id, recipient_id, template_id, scheduled_date,
               status, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, 'planned', ?5, ?5)
             ON CONFLICT (recipient_id, template_id) WHERE status = 'planned'
             DO UPDATE SET scheduled_date = excluded.scheduled_date,
                           updated_at     = excluded.updated_at
             RETURNING {SCHEDULE_COLUMNS}"
          ),
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            recipient_id,
            encode_uuid(template_id),
            encode_date(date),
            now,
          ],
          RawSchedule::from_row,
        )?;
        raw.into_schedule()
      })
      .await?;

    tracing::info!(
      recipient_id,
      template_id = %template_id,
      schedule_id = %schedule.schedule_id,
      date = %date,
      "visit planned"
    );
    Ok(schedule)
  }

  async fn list_schedules(&self, recipient_id: i64) -> Result<Vec<VisitSchedule>> {
    let raws: Vec<RawSchedule> = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SCHEDULE_COLUMNS} FROM schedules
           WHERE recipient_id = ?1
           ORDER BY scheduled_date ASC, created_at ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![recipient_id], RawSchedule::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSchedule::into_schedule).collect()
  }

  async fn resolve_schedule(&self, recipient_id: i64, template_id: Uuid) -> Result<bool> {
    let resolved = self
      .write(move |conn| complete_planned(conn, recipient_id, template_id))
      .await?;
    if resolved {
      tracing::debug!(recipient_id, template_id = %template_id, "schedule resolved");
    }
    Ok(resolved)
  }
}
