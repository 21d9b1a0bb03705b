use carebook_core::{
  ErrorKind, StoreError,
  answer::Answers,
  record::{NewRecord, Period},
  store::{RecordStore, ScheduleStore, TemplateStore},
  template::{FieldKind, NewTemplate, Stage},
};
use chrono::NaiveDate;
use uuid::Uuid;

use super::{field, monthly, recipient, recurring, store};
use crate::Error;

#[tokio::test]
async fn create_and_get_template() {
  let s = store().await;
  let t = monthly(&s, "Month 3 checkup", &[3]).await;
  assert!(t.active);

  let fetched = s.get_template(t.template_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Month 3 checkup");
  assert_eq!(fetched.stage, Stage::Antenatal);
  assert_eq!(fetched.target_periods.iter().copied().collect::<Vec<_>>(), vec![3]);
  assert_eq!(fetched.fields.len(), 2);
}

#[tokio::test]
async fn get_template_missing_returns_none() {
  let s = store().await;
  assert!(s.get_template(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn antenatal_template_without_periods_is_rejected() {
  let s = store().await;
  let err = s
    .create_template(NewTemplate::new("Loose", Stage::Antenatal, vec![]))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(s.list_all_templates().await.unwrap().is_empty());
}

#[tokio::test]
async fn list_filters_by_stage_and_period() {
  let s = store().await;
  let m3 = monthly(&s, "Month 3", &[3]).await;
  let m3_5 = monthly(&s, "Months 3 and 5", &[3, 5]).await;
  let vitals = recurring(&s, "Vitals").await;
  s.create_template(NewTemplate::new(
    "PNC",
    Stage::Postnatal,
    vec![field("notes", FieldKind::Text, false)],
  ))
  .await
  .unwrap();

  let all = s.list_templates(Stage::Antenatal, None).await.unwrap();
  assert_eq!(all.len(), 3);

  let ids = |p: u32| {
    let s = s.clone();
    async move {
      s.list_templates(Stage::Antenatal, Some(Period::from(p)))
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.template_id)
        .collect::<Vec<_>>()
    }
  };

  let p3 = ids(3).await;
  assert_eq!(p3.len(), 3);
  let p5 = ids(5).await;
  assert!(p5.contains(&m3_5.template_id) && p5.contains(&vitals.template_id));
  assert!(!p5.contains(&m3.template_id));
  assert_eq!(ids(7).await, vec![vitals.template_id]);
}

#[tokio::test]
async fn list_orders_by_sort_key_then_recency() {
  let s = store().await;
  let mut first = NewTemplate::new("First", Stage::Postnatal, vec![]);
  first.sort_order = 1;
  let first = s.create_template(first).await.unwrap();
  let older = s
    .create_template(NewTemplate::new("Older", Stage::Postnatal, vec![]))
    .await
    .unwrap();
  let newer = s
    .create_template(NewTemplate::new("Newer", Stage::Postnatal, vec![]))
    .await
    .unwrap();

  let listed: Vec<_> = s
    .list_templates(Stage::Postnatal, None)
    .await
    .unwrap()
    .into_iter()
    .map(|t| t.template_id)
    .collect();
  assert_eq!(listed, vec![newer.template_id, older.template_id, first.template_id]);
}

#[tokio::test]
async fn toggle_hides_template_from_active_lists() {
  let s = store().await;
  let t = monthly(&s, "Month 1", &[1]).await;

  let off = s.toggle_template_active(t.template_id).await.unwrap();
  assert!(!off.active);
  assert!(s.list_templates(Stage::Antenatal, None).await.unwrap().is_empty());
  assert_eq!(s.list_all_templates().await.unwrap().len(), 1);

  let on = s.toggle_template_active(t.template_id).await.unwrap();
  assert!(on.active);

  let err = s.toggle_template_active(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_without_records_removes_schedules() {
  let s = store().await;
  let t = monthly(&s, "Month 2", &[2]).await;
  let r = recipient(&s, "Asha", "Shiroli").await;
  s.plan_visit(r.recipient_id, t.template_id, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
    .await
    .unwrap();

  let deleted = s.delete_template(t.template_id, false).await.unwrap();
  assert_eq!(deleted.records_deleted, 0);
  assert_eq!(deleted.schedules_deleted, 1);
  assert!(s.get_template(t.template_id).await.unwrap().is_none());
  assert!(s.list_schedules(r.recipient_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_with_records_needs_cascade() {
  let s = store().await;
  let t = recurring(&s, "Vitals").await;
  let r = recipient(&s, "Asha", "Shiroli").await;
  let mut answers = Answers::new();
  answers.insert("bp".into(), "120/80".into());
  s.save_record(NewRecord::new(r.recipient_id, t.template_id, 1, answers))
    .await
    .unwrap();

  let err = s.delete_template(t.template_id, false).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(carebook_core::Error::TemplateInUse { records: 1, .. })
  ));
  assert!(s.get_template(t.template_id).await.unwrap().is_some());

  let deleted = s.delete_template(t.template_id, true).await.unwrap();
  assert_eq!(deleted.records_deleted, 1);
  assert!(s.get_template(t.template_id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_missing_template_is_not_found() {
  let s = store().await;
  let err = s.delete_template(Uuid::new_v4(), true).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}
