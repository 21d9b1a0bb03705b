//! Timeline reads: load one consistent snapshot, then reconcile in memory.

use carebook_core::{
  Error as CoreError,
  record::Period,
  store::TimelineStore,
  template::Stage,
  timeline::{RecordMark, Timeline, reconcile},
};
use chrono::{NaiveDate, Utc};

use super::{SqliteStore, recipient_exists};
use crate::{
  Result,
  encode::{
    RawSchedule, RawTemplate, SCHEDULE_COLUMNS, TEMPLATE_COLUMNS, decode_uuid, encode_stage,
  },
};

impl TimelineStore for SqliteStore {
  async fn reconcile_timeline(
    &self,
    recipient_id: i64,
    stage: Stage,
    today: Option<NaiveDate>,
  ) -> Result<Timeline> {
    let stage_str = encode_stage(stage);

    let (templates, schedules, marks) = self
      .read(move |conn| {
        if !recipient_exists(conn, recipient_id)? {
          return Err(CoreError::RecipientNotFound(recipient_id).into());
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE stage = ?1 AND active = 1"
        ))?;
        let templates = stmt
          .query_map(rusqlite::params![stage_str], RawTemplate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {SCHEDULE_COLUMNS} FROM schedules
           WHERE recipient_id = ?1 AND status = 'planned'"
        ))?;
        let schedules = stmt
          .query_map(rusqlite::params![recipient_id], RawSchedule::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT DISTINCT template_id, period FROM records WHERE recipient_id = ?1",
        )?;
        let marks = stmt
          .query_map(rusqlite::params![recipient_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((templates, schedules, marks))
      })
      .await?;

    let templates = templates
      .into_iter()
      .map(RawTemplate::into_template)
      .collect::<Result<Vec<_>>>()?;
    let schedules = schedules
      .into_iter()
      .map(RawSchedule::into_schedule)
      .collect::<Result<Vec<_>>>()?;
    let marks = marks
      .into_iter()
      .map(|(template_id, period)| {
        Ok(RecordMark { template_id: decode_uuid(&template_id)?, period: Period::from(period) })
      })
      .collect::<Result<Vec<_>>>()?;

    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(reconcile(recipient_id, stage, &templates, &schedules, &marks, today))
  }
}
