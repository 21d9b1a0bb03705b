//! Integration tests for `SqliteStore` against an in-memory database.

use carebook_core::{
  recipient::{CareRecipient, NewRecipient},
  store::{AllocationStore, RecipientStore, TemplateStore},
  template::{FieldDef, FieldKind, FormTemplate, NewTemplate, Stage},
  worker::{NewWorker, Worker},
};

use crate::SqliteStore;

mod templates;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn field(name: &str, kind: FieldKind, required: bool) -> FieldDef {
  FieldDef {
    name: name.into(),
    label: name.into(),
    kind,
    required,
    options: vec![],
  }
}

/// An antenatal checkup due in the given pregnancy months.
async fn monthly(s: &SqliteStore, title: &str, months: &[u32]) -> FormTemplate {
  let input = NewTemplate::new(
    title,
    Stage::Antenatal,
    vec![
      field("weight", FieldKind::Number, true),
      field("notes", FieldKind::Text, false),
    ],
  )
  .with_periods(months.iter().copied());
  s.create_template(input).await.unwrap()
}

/// A recurring antenatal template, i.e. append-only history.
async fn recurring(s: &SqliteStore, title: &str) -> FormTemplate {
  let input = NewTemplate::new(
    title,
    Stage::Antenatal,
    vec![field("bp", FieldKind::Text, true)],
  )
  .recurring();
  s.create_template(input).await.unwrap()
}

async fn recipient(s: &SqliteStore, name: &str, village: &str) -> CareRecipient {
  s.register_recipient(NewRecipient::manual(name).in_village(village))
    .await
    .unwrap()
}

async fn worker(s: &SqliteStore, username: &str) -> Worker {
  s.add_worker(NewWorker {
    name:          format!("Worker {username}"),
    username:      username.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    contact:       None,
    village:       None,
  })
  .await
  .unwrap()
}
