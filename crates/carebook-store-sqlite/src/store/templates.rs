//! Form template storage.

use carebook_core::{
  Error as CoreError,
  record::Period,
  store::TemplateStore,
  template::{FormTemplate, NewTemplate, Stage, TemplateDeletion},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use super::{SqliteStore, fetch_template};
use crate::{
  Result,
  encode::{RawTemplate, TEMPLATE_COLUMNS, encode_dt, encode_stage, encode_uuid},
};

impl TemplateStore for SqliteStore {
  async fn create_template(&self, input: NewTemplate) -> Result<FormTemplate> {
    input.validate()?;

    let template = FormTemplate {
      template_id:    Uuid::new_v4(),
      title:          input.title.trim().to_owned(),
      stage:          input.stage,
      fields:         input.fields,
      target_periods: input.target_periods,
      recurring:      input.recurring,
      active:         true,
      sort_order:     input.sort_order,
      created_at:     Utc::now(),
    };

    let id_str      = encode_uuid(template.template_id);
    let title       = template.title.clone();
    let stage_str   = encode_stage(template.stage);
    let fields_json = serde_json::to_string(&template.fields)?;
    let periods     = serde_json::to_string(&template.target_periods)?;
    let recurring   = template.recurring;
    let sort_order  = template.sort_order;
    let at_str      = encode_dt(template.created_at);

    self
      .write(move |conn| {
        conn.execute(
          "INSERT INTO templates (
             template_id, title, stage, fields, target_periods,
             recurring, active, sort_order, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
          rusqlite::params![
            id_str,
            title,
            stage_str,
            fields_json,
            periods,
            recurring,
            sort_order,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(
      template_id = %template.template_id,
      stage = %template.stage,
      title = %template.title,
      "template created"
    );
    Ok(template)
  }

  async fn get_template(&self, id: Uuid) -> Result<Option<FormTemplate>> {
    self.read(move |conn| fetch_template(conn, id)).await
  }

  async fn list_templates(
    &self,
    stage: Stage,
    period: Option<Period>,
  ) -> Result<Vec<FormTemplate>> {
    let stage_str = encode_stage(stage);

    let raws: Vec<RawTemplate> = self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TEMPLATE_COLUMNS} FROM templates
           WHERE stage = ?1 AND active = 1
           ORDER BY sort_order ASC, created_at DESC, template_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![stage_str], RawTemplate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut templates: Vec<FormTemplate> = raws
      .into_iter()
      .map(RawTemplate::into_template)
      .collect::<Result<_>>()?;

    // Target periods are a JSON set, so applicability is decided here.
    if let Some(p) = period {
      templates.retain(|t| t.applies_to(p.get()));
    }
    Ok(templates)
  }

  async fn list_all_templates(&self) -> Result<Vec<FormTemplate>> {
    let raws: Vec<RawTemplate> = self
      .read(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TEMPLATE_COLUMNS} FROM templates
           ORDER BY sort_order ASC, created_at DESC, template_id ASC"
        ))?;
        let rows = stmt
          .query_map([], RawTemplate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTemplate::into_template).collect()
  }

  async fn toggle_template_active(&self, id: Uuid) -> Result<FormTemplate> {
    let template = self
      .write(move |conn| {
        let changed = conn.execute(
          "UPDATE templates SET active = NOT active WHERE template_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;
        if changed == 0 {
          return Err(CoreError::TemplateNotFound(id).into());
        }
        fetch_template(conn, id)?.ok_or_else(|| CoreError::TemplateNotFound(id).into())
      })
      .await?;

    tracing::info!(template_id = %id, active = template.active, "template toggled");
    Ok(template)
  }

  async fn delete_template(&self, id: Uuid, cascade: bool) -> Result<TemplateDeletion> {
    let deletion = self
      .write(move |conn| {
        let id_str = encode_uuid(id);

        let exists = conn
          .query_row(
            "SELECT 1 FROM templates WHERE template_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Err(CoreError::TemplateNotFound(id).into());
        }

        let records: u64 = conn.query_row(
          "SELECT COUNT(*) FROM records WHERE template_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        if records > 0 && !cascade {
          return Err(CoreError::TemplateInUse { template_id: id, records }.into());
        }

        let records_deleted = conn.execute(
          "DELETE FROM records WHERE template_id = ?1",
          rusqlite::params![id_str],
        )? as u64;
        let schedules_deleted = conn.execute(
          "DELETE FROM schedules WHERE template_id = ?1",
          rusqlite::params![id_str],
        )? as u64;
        conn.execute(
          "DELETE FROM templates WHERE template_id = ?1",
          rusqlite::params![id_str],
        )?;

        Ok(TemplateDeletion { records_deleted, schedules_deleted })
      })
      .await?;

    tracing::info!(
      template_id = %id,
      records = deletion.records_deleted,
      schedules = deletion.schedules_deleted,
      "template deleted"
    );
    Ok(deletion)
  }
}
