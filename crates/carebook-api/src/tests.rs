use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{HeaderMap, Request, StatusCode, header},
};
use carebook_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn oneshot_raw(
  app:     &Router,
  method:  &str,
  uri:     &str,
  headers: Vec<(header::HeaderName, &str)>,
  body:    Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  for (k, v) in headers {
    builder = builder.header(k, v);
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

  let status = resp.status();
  let headers = resp.headers().clone();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, headers, value)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let (status, _, value) = oneshot_raw(app, method, uri, vec![], body).await;
  (status, value)
}

async fn monthly_template(app: &Router, months: &[u32]) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/templates",
    Some(json!({
      "title": "Monthly check-up",
      "stage": "antenatal",
      "target_periods": months,
      "fields": [
        { "name": "weight", "label": "Weight (kg)", "type": "number", "required": true },
        { "name": "notes", "label": "Notes", "type": "text" }
      ]
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["template_id"].as_str().unwrap().to_owned()
}

async fn manual_recipient(app: &Router, name: &str, village: &str) -> i64 {
  let (status, body) = send(
    app,
    "POST",
    "/recipients",
    Some(json!({ "name": name, "village": village, "source": "manual" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["recipient_id"].as_i64().unwrap()
}

async fn new_worker(app: &Router, username: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/workers",
    Some(json!({ "name": "Field Worker", "username": username, "password": "hunter2" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["worker_id"].as_str().unwrap().to_owned()
}

// ── Templates ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_templates_by_stage_and_period() {
  let app = app().await;
  let id = monthly_template(&app, &[2, 5]).await;

  let (status, body) = send(&app, "GET", "/templates?stage=antenatal&period=5", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 1);
  assert_eq!(body[0]["template_id"], id.as_str());

  let (_, body) = send(&app, "GET", "/templates?stage=antenatal&period=3", None).await;
  assert!(body.as_array().unwrap().is_empty());

  let (_, body) = send(&app, "GET", "/templates?stage=postnatal", None).await;
  assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn antenatal_template_without_periods_is_rejected() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/templates",
    Some(json!({ "title": "Orphan", "stage": "antenatal", "fields": [] })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
  let app = app().await;
  let (status, _, body) = oneshot_raw(
    &app,
    "POST",
    "/templates",
    vec![],
    Some(json!({ "title": "No stage" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn malformed_query_and_path_use_the_error_body() {
  let app = app().await;
  let tid = uuid::Uuid::new_v4();
  for uri in [
    format!("/records?recipient_id=abc&template_id={tid}"),
    "/templates?stage=prenatal".to_owned(),
    "/templates/not-a-uuid".to_owned(),
    "/recipients/abc/timeline".to_owned(),
  ] {
    let (status, headers, body) = oneshot_raw(&app, "GET", &uri, vec![], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    assert_eq!(
      headers.get(header::CONTENT_TYPE).unwrap().to_str().unwrap(),
      "application/json",
      "{uri}"
    );
    assert_eq!(body["kind"], "validation", "{uri}");
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
  }
}

#[tokio::test]
async fn get_unknown_template_returns_404() {
  let app = app().await;
  let (status, body) =
    send(&app, "GET", &format!("/templates/{}", uuid::Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn toggle_hides_template_from_stage_listing() {
  let app = app().await;
  let id = monthly_template(&app, &[1]).await;

  let (status, body) = send(&app, "POST", &format!("/templates/{id}/toggle"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["active"], false);

  let (_, body) = send(&app, "GET", "/templates?stage=antenatal", None).await;
  assert!(body.as_array().unwrap().is_empty());
  let (_, body) = send(&app, "GET", "/templates", None).await;
  assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_template_in_use_needs_cascade() {
  let app = app().await;
  let tid = monthly_template(&app, &[1]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  let (status, _) = send(
    &app,
    "POST",
    "/records",
    Some(json!({
      "recipient_id": rid, "template_id": tid, "period": 1, "answers": { "weight": 58 }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(&app, "DELETE", &format!("/templates/{tid}"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "conflict");

  let (status, body) =
    send(&app, "DELETE", &format!("/templates/{tid}?cascade=true"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["records_deleted"], 1);
}

// ── Records ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_then_resave_same_period_returns_created_then_ok() {
  let app = app().await;
  let tid = monthly_template(&app, &[2, 5]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  let body = |weight: u32| {
    json!({
      "recipient_id": rid, "template_id": tid, "period": 2, "answers": { "weight": weight }
    })
  };

  let (status, first) = send(&app, "POST", "/records", Some(body(60))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["outcome"], "created");

  let (status, second) = send(&app, "POST", "/records", Some(body(61))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["outcome"], "updated");
  assert_eq!(second["record"]["record_id"], first["record"]["record_id"]);
}

#[tokio::test]
async fn lookup_carries_forward_earlier_period() {
  let app = app().await;
  let tid = monthly_template(&app, &[2, 5]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  send(
    &app,
    "POST",
    "/records",
    Some(json!({
      "recipient_id": rid, "template_id": tid, "period": 2, "answers": { "weight": 60 }
    })),
  )
  .await;

  let uri = format!("/records?recipient_id={rid}&template_id={tid}&period=5");
  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["kind"], "carried_forward");
  assert_eq!(body["record"]["source_period"], 2);
  assert_eq!(body["record"]["period"], 5);
  assert_eq!(body["record"]["answers"]["weight"], 60.0);

  let uri = format!("/records?recipient_id={rid}&template_id={tid}&period=1");
  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.is_null());
}

#[tokio::test]
async fn negative_period_is_rejected() {
  let app = app().await;
  let tid = monthly_template(&app, &[2]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  let uri = format!("/records?recipient_id={rid}&template_id={tid}&period=-1");
  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn missing_required_answer_is_rejected() {
  let app = app().await;
  let tid = monthly_template(&app, &[2]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  let (status, _) = send(
    &app,
    "POST",
    "/records",
    Some(json!({
      "recipient_id": rid, "template_id": tid, "period": 2, "answers": { "notes": "ok" }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Schedules & timeline ─────────────────────────────────────────────────────

#[tokio::test]
async fn plan_visit_rejects_malformed_date() {
  let app = app().await;
  let tid = monthly_template(&app, &[1]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  let (status, body) = send(
    &app,
    "POST",
    "/schedules",
    Some(json!({ "recipient_id": rid, "template_id": tid, "date": "03/04/2024" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn replanning_keeps_one_planned_visit() {
  let app = app().await;
  let tid = monthly_template(&app, &[1]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  for date in ["2024-03-01", "2024-03-15"] {
    let (status, _) = send(
      &app,
      "POST",
      "/schedules",
      Some(json!({ "recipient_id": rid, "template_id": tid, "date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (status, body) = send(&app, "GET", &format!("/recipients/{rid}/schedules"), None).await;
  assert_eq!(status, StatusCode::OK);
  let schedules = body.as_array().unwrap();
  assert_eq!(schedules.len(), 1);
  assert_eq!(schedules[0]["scheduled_date"], "2024-03-15");
  assert_eq!(schedules[0]["status"], "planned");
}

#[tokio::test]
async fn timeline_reports_missed_visit_and_honours_etag() {
  let app = app().await;
  let tid = monthly_template(&app, &[1]).await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;
  send(
    &app,
    "POST",
    "/schedules",
    Some(json!({ "recipient_id": rid, "template_id": tid, "date": "2024-03-01" })),
  )
  .await;

  let uri = format!("/recipients/{rid}/timeline?as_of=2024-03-10");
  let (status, headers, body) = oneshot_raw(&app, "GET", &uri, vec![], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["stage"], "antenatal");
  assert_eq!(body["total"], 1);
  assert_eq!(body["completion_percent"], 0);
  let month_one = &body["periods"][0];
  assert_eq!(month_one["period"], 1);
  assert_eq!(month_one["entries"][0]["status"], "missed");

  let etag = headers.get(header::ETAG).unwrap().to_str().unwrap().to_owned();
  assert!(etag.starts_with('"') && etag.ends_with('"'));

  let (status, _, body) =
    oneshot_raw(&app, "GET", &uri, vec![(header::IF_NONE_MATCH, etag.as_str())], None).await;
  assert_eq!(status, StatusCode::NOT_MODIFIED);
  assert!(body.is_null());

  // Completing the visit changes the matrix, so the old tag no longer matches.
  send(
    &app,
    "POST",
    "/records",
    Some(json!({
      "recipient_id": rid, "template_id": tid, "period": 1, "answers": { "weight": 55 }
    })),
  )
  .await;
  let (status, headers, body) =
    oneshot_raw(&app, "GET", &uri, vec![(header::IF_NONE_MATCH, etag.as_str())], None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["periods"][0]["entries"][0]["status"], "done");
  assert_ne!(headers.get(header::ETAG).unwrap().to_str().unwrap(), etag);
}

#[tokio::test]
async fn timeline_for_unknown_recipient_returns_404() {
  let app = app().await;
  let (status, _) = send(&app, "GET", "/recipients/999/timeline", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&app, "GET", "/recipients/999/timeline?stage=postnatal", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Recipients ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn recipient_stage_update_and_delete() {
  let app = app().await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;

  let (status, body) = send(
    &app,
    "PUT",
    &format!("/recipients/{rid}/stage"),
    Some(json!({ "stage": "postnatal" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["stage"], "postnatal");

  let (status, body) = send(&app, "DELETE", &format!("/recipients/{rid}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  assert!(body.is_null());

  let (status, _) = send(&app, "GET", &format!("/recipients/{rid}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn imported_recipient_cannot_be_deleted() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/recipients",
    Some(json!({ "name": "Imported", "external_id": "REG-1" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data_complete"], false);
  let rid = body["recipient_id"].as_i64().unwrap();

  let (status, _) = send(&app, "DELETE", &format!("/recipients/{rid}"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(
    &app,
    "POST",
    "/recipients",
    Some(json!({ "name": "Again", "external_id": "REG-1" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ── Workers & allocation ─────────────────────────────────────────────────────

#[tokio::test]
async fn worker_password_is_hashed_and_never_returned() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/workers",
    Some(json!({ "name": "Meera", "username": "meera", "password": "hunter2" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(body.get("password").is_none());
  assert!(body.get("password_hash").is_none());

  let (status, _) = send(
    &app,
    "POST",
    "/workers",
    Some(json!({ "name": "Other", "username": "MEERA", "password": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = send(
    &app,
    "POST",
    "/workers",
    Some(json!({ "name": "Blank", "username": "blank", "password": "" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn allocation_by_village_then_summary() {
  let app = app().await;
  let wid = new_worker(&app, "meera").await;
  manual_recipient(&app, "Asha", "Rampur").await;
  manual_recipient(&app, "Bina", "rampur ").await;
  manual_recipient(&app, "Chitra", "Sitapur").await;

  let (status, body) = send(
    &app,
    "POST",
    "/allocations/village",
    Some(json!({ "village": "RAMPUR", "worker_id": wid })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "count": 2 }));

  let (status, body) = send(
    &app,
    "POST",
    "/allocations/village",
    Some(json!({ "village": "Rampur", "worker_id": wid })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

  let (_, body) = send(&app, "GET", "/allocations/summary", None).await;
  assert_eq!(body["total"], 3);
  assert_eq!(body["unassigned"], 1);

  let (_, body) = send(&app, "GET", &format!("/workers/{wid}"), None).await;
  assert_eq!(body["workload"], 2);
}

#[tokio::test]
async fn loaded_worker_cannot_be_deactivated_or_deleted() {
  let app = app().await;
  let wid = new_worker(&app, "meera").await;
  let rid = manual_recipient(&app, "Asha", "Rampur").await;

  let (status, body) = send(
    &app,
    "POST",
    "/allocations/manual",
    Some(json!({ "recipient_ids": [rid], "worker_id": wid })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["count"], 1);

  let (status, _) = send(
    &app,
    "PUT",
    &format!("/workers/{wid}/active"),
    Some(json!({ "active": false })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  let (status, _) = send(&app, "DELETE", &format!("/workers/{wid}"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn allocation_by_limit_rejects_zero_and_drains_pool() {
  let app = app().await;
  let wid = new_worker(&app, "meera").await;
  manual_recipient(&app, "Asha", "Rampur").await;
  manual_recipient(&app, "Bina", "Sitapur").await;

  let (status, _) = send(
    &app,
    "POST",
    "/allocations/limit",
    Some(json!({ "limit": 0, "worker_id": wid })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = send(
    &app,
    "POST",
    "/allocations/limit",
    Some(json!({ "limit": 5, "worker_id": wid })),
  )
  .await;
  assert_eq!(body["count"], 2);

  let (status, _) = send(
    &app,
    "POST",
    "/allocations/limit",
    Some(json!({ "limit": 5, "worker_id": wid })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
