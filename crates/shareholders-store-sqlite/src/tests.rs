//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeDelta, Utc};
use shareholders_core::{
  Error as CoreError,
  credentials::{PasswordChange, hash_reset_token, verify_password},
  news::NewBusinessNews,
  shareholder::{NewShareholder, NextOfKin},
  store::{NewsStore, OrderBook, ShareholderQuery, ShareholderStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore, encode::encode_dt};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn registration(email: &str, phone: &str) -> NewShareholder {
  NewShareholder {
    name: Some("Grace Hopper".into()),
    address: Some("1 Navy Yard, Washington".into()),
    email: Some(email.into()),
    phone_number: Some(phone.into()),
    proof_of_identity: Some("uploads/id/grace.pdf".into()),
    proof_of_address: Some("uploads/address/grace.pdf".into()),
    password: Some("cobol-forever".into()),
    password_confirm: Some("cobol-forever".into()),
    ..Default::default()
  }
}

fn grace() -> NewShareholder {
  registration("grace@example.com", "555-123-4567")
}

// ─── Registration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_get() {
  let s = store().await;

  let registered = s.register(grace()).await.unwrap();
  assert!(registered.active);
  assert_eq!(registered.shareholding, 0.0);

  let fetched = s.get(registered.shareholder_id).await.unwrap().unwrap();
  assert_eq!(fetched, registered);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn email_is_lowercased_on_register_and_lookup() {
  let s = store().await;
  let registered = s
    .register(registration("Grace@Example.COM", "555-123-4567"))
    .await
    .unwrap();
  assert_eq!(registered.email, "grace@example.com");

  let found = s.find_by_email("GRACE@example.com").await.unwrap().unwrap();
  assert_eq!(found.shareholder_id, registered.shareholder_id);
}

#[tokio::test]
async fn password_is_stored_hashed() {
  let s = store().await;
  let registered = s.register(grace()).await.unwrap();

  let creds = s
    .credentials(registered.shareholder_id)
    .await
    .unwrap()
    .unwrap();
  assert_ne!(creds.password_hash, "cobol-forever");
  assert!(creds.password_hash.starts_with("$argon2id$"));
  assert!(verify_password("cobol-forever", &creds.password_hash));
  assert!(!verify_password("cobol-never", &creds.password_hash));
}

#[tokio::test]
async fn confirmation_has_no_column() {
  let s = store().await;
  s.register(grace()).await.unwrap();

  let columns: Vec<String> = s
    .conn
    .call(|conn| {
      let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_info('shareholders')")?;
      let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
      Ok(rows)
    })
    .await
    .unwrap();
  assert!(columns.iter().all(|c| !c.contains("confirm")));
  assert!(!columns.iter().any(|c| c == "password"));
}

#[tokio::test]
async fn missing_field_is_rejected() {
  let s = store().await;
  let mut input = grace();
  input.proof_of_address = None;

  let err = s.register(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::MissingRequiredField {
      field: "proof_of_address",
      ..
    })
  ));
  let all = s.find_active(&ShareholderQuery::default()).await.unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn invalid_email_is_rejected() {
  let s = store().await;
  let err = s
    .register(registration("grace.example.com", "555-123-4567"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::FormatValidation { field: "email", .. })
  ));
}

#[tokio::test]
async fn confirmation_mismatch_is_rejected() {
  let s = store().await;
  let mut input = grace();
  input.password_confirm = Some("cobol-forevr".into());

  let err = s.register(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConfirmationMismatch)));
}

#[tokio::test]
async fn invalid_email_outranks_missing_password() {
  let s = store().await;
  let mut input = registration("not-an-email", "555-123-4567");
  input.password = None;
  input.password_confirm = None;

  let err = s.register(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::FormatValidation { field: "email", .. })
  ));
}

// ─── Uniqueness ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.register(grace()).await.unwrap();

  let err = s
    .register(registration("GRACE@example.com", "555-987-6543"))
    .await
    .unwrap_err();
  assert_eq!(err.conflicting_field(), Some("email"));
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
  let s = store().await;
  s.register(grace()).await.unwrap();

  let err = s
    .register(registration("hopper@example.com", "555-123-4567"))
    .await
    .unwrap_err();
  assert_eq!(err.conflicting_field(), Some("phone_number"));
}

#[tokio::test]
async fn uniqueness_spans_deactivated_accounts() {
  let s = store().await;
  let first = s.register(grace()).await.unwrap();
  s.set_active(first.shareholder_id, false).await.unwrap();

  let err = s
    .register(registration("grace@example.com", "555-987-6543"))
    .await
    .unwrap_err();
  assert_eq!(err.conflicting_field(), Some("email"));
}

#[tokio::test]
async fn concurrent_registrations_admit_one() {
  let s = store().await;
  let (a, b) = tokio::join!(
    s.register(registration("race@example.com", "555-000-0001")),
    s.register(registration("race@example.com", "555-000-0002")),
  );

  let results = [a, b];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  let err = results.into_iter().find_map(Result::err).unwrap();
  assert_eq!(err.conflicting_field(), Some("email"));
}

#[tokio::test]
async fn save_into_taken_email_is_rejected() {
  let s = store().await;
  s.register(grace()).await.unwrap();
  let mut other = s
    .register(registration("hopper@example.com", "555-987-6543"))
    .await
    .unwrap();

  other.email = "grace@example.com".into();
  let err = s.save(&other).await.unwrap_err();
  assert_eq!(err.conflicting_field(), Some("email"));
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn deactivated_accounts_vanish_from_default_reads() {
  let s = store().await;
  let keep = s.register(grace()).await.unwrap();
  let gone = s
    .register(registration("gone@example.com", "555-987-6543"))
    .await
    .unwrap();

  s.set_active(gone.shareholder_id, false).await.unwrap();

  let active = s.find_active(&ShareholderQuery::default()).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].shareholder_id, keep.shareholder_id);

  let by_email = ShareholderQuery {
    email: Some("gone@example.com".into()),
    ..Default::default()
  };
  assert!(s.find_active(&by_email).await.unwrap().is_empty());
  assert!(s.get(gone.shareholder_id).await.unwrap().is_none());
  assert!(s.find_by_email("gone@example.com").await.unwrap().is_none());
  assert!(s.credentials(gone.shareholder_id).await.unwrap().is_none());

  let all = s.find_including_inactive(&by_email).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].shareholder_id, gone.shareholder_id);
  assert!(!all[0].active);
}

#[tokio::test]
async fn reactivation_restores_visibility() {
  let s = store().await;
  let r = s.register(grace()).await.unwrap();

  s.set_active(r.shareholder_id, false).await.unwrap();
  assert!(s.get(r.shareholder_id).await.unwrap().is_none());

  s.set_active(r.shareholder_id, true).await.unwrap();
  assert!(s.get(r.shareholder_id).await.unwrap().is_some());
}

#[tokio::test]
async fn set_active_unknown_id_errors() {
  let s = store().await;
  let err = s.set_active(Uuid::new_v4(), false).await.unwrap_err();
  assert!(matches!(err, Error::ShareholderNotFound(_)));
}

#[tokio::test]
async fn saving_a_deactivated_account_errors() {
  let s = store().await;
  let r = s.register(grace()).await.unwrap();
  s.set_active(r.shareholder_id, false).await.unwrap();

  let err = s.save(&r).await.unwrap_err();
  assert!(matches!(err, Error::ShareholderNotFound(_)));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_filters_and_paging() {
  let s = store().await;
  let mut ada = s
    .register(NewShareholder {
      name: Some("Ada Lovelace".into()),
      ..registration("ada@example.com", "555-000-0001")
    })
    .await
    .unwrap();
  s.register(registration("grace@example.com", "555-000-0002"))
    .await
    .unwrap();
  s.register(registration("hopper@example.com", "555-000-0003"))
    .await
    .unwrap();

  ada.is_login_activated = true;
  s.save(&ada).await.unwrap();

  let activated = s
    .find_active(&ShareholderQuery {
      is_login_activated: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(activated.len(), 1);
  assert_eq!(activated[0].shareholder_id, ada.shareholder_id);

  let graces = s
    .find_active(&ShareholderQuery {
      name_contains: Some("GRACE".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(graces.len(), 2);

  let wildcard = s
    .find_active(&ShareholderQuery {
      name_contains: Some("%".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(wildcard.is_empty());

  let page = s
    .find_active(&ShareholderQuery {
      limit: Some(2),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 2);
  assert_ne!(page[0].shareholder_id, ada.shareholder_id);
}

// ─── Saves ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_updates_mutable_fields_only() {
  let s = store().await;
  let registered = s.register(grace()).await.unwrap();

  let mut edited = registered.clone();
  edited.shareholding = 1250.5;
  edited.email = "Grace.Hopper@Example.com".into();
  edited.image = Some("uploads/img/grace.png".into());
  edited.next_of_kin = Some(NextOfKin {
    name:    "Vincent Hopper".into(),
    email:   "Vincent@Example.com".into(),
    address: "1 Navy Yard, Washington".into(),
  });
  edited.created_at = Utc::now() + TimeDelta::days(365);

  let saved = s.save(&edited).await.unwrap();
  assert_eq!(saved.shareholding, 1250.5);
  assert_eq!(saved.email, "grace.hopper@example.com");
  assert_eq!(saved.image.as_deref(), Some("uploads/img/grace.png"));
  assert_eq!(saved.next_of_kin.unwrap().email, "vincent@example.com");
  assert_eq!(saved.created_at, registered.created_at);
  assert!(saved.password_changed_at.is_none());
}

#[tokio::test]
async fn save_revalidates() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();
  r.phone_number = "not a phone".into();

  let err = s.save(&r).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::FormatValidation { field: "phone_number", .. })
  ));
}

// ─── Password change ─────────────────────────────────────────────────────────

#[tokio::test]
async fn change_password_rehashes_and_stamps() {
  let s = store().await;
  let r = s.register(grace()).await.unwrap();

  let before = Utc::now();
  let changed = s
    .change_password(
      r.shareholder_id,
      PasswordChange::new("nanoseconds", "nanoseconds"),
    )
    .await
    .unwrap();

  let creds = s.credentials(r.shareholder_id).await.unwrap().unwrap();
  assert!(verify_password("nanoseconds", &creds.password_hash));
  assert!(!verify_password("cobol-forever", &creds.password_hash));

  let stored = s.get(r.shareholder_id).await.unwrap().unwrap();
  assert_eq!(stored.password_changed_at, changed.password_changed_at);
  let changed_at = stored.password_changed_at.unwrap();
  assert!(changed_at < before);
  assert!(before - changed_at < TimeDelta::seconds(5));

  let t = Utc::now().timestamp();
  assert!(stored.was_password_changed_after(t - 10));
  assert!(!stored.was_password_changed_after(t));
}

#[tokio::test]
async fn change_password_mismatch_leaves_hash() {
  let s = store().await;
  let r = s.register(grace()).await.unwrap();

  let err = s
    .change_password(
      r.shareholder_id,
      PasswordChange::new("nanoseconds", "microseconds"),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::ConfirmationMismatch)));

  let creds = s.credentials(r.shareholder_id).await.unwrap().unwrap();
  assert!(verify_password("cobol-forever", &creds.password_hash));
  let stored = s.get(r.shareholder_id).await.unwrap().unwrap();
  assert!(stored.password_changed_at.is_none());
}

// ─── Password reset ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_token_round_trip() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();

  let token = r.generate_password_reset_token();
  s.store_reset_token(&r).await.unwrap();

  let stored = s.get(r.shareholder_id).await.unwrap().unwrap();
  assert_eq!(stored.password_reset_token, Some(hash_reset_token(&token)));
  assert_ne!(stored.password_reset_token.as_deref(), Some(token.as_str()));

  let found = s.find_by_reset_token(&token).await.unwrap().unwrap();
  assert_eq!(found.shareholder_id, r.shareholder_id);

  let reset = s
    .reset_password(
      token.clone(),
      PasswordChange::new("a-new-secret", "a-new-secret"),
    )
    .await
    .unwrap();
  assert!(reset.password_reset_token.is_none());
  assert!(reset.password_changed_at.is_some());

  let stored = s.get(r.shareholder_id).await.unwrap().unwrap();
  assert!(stored.password_reset_token.is_none());
  assert!(stored.password_reset_expires.is_none());
  let creds = s.credentials(r.shareholder_id).await.unwrap().unwrap();
  assert!(verify_password("a-new-secret", &creds.password_hash));

  let err = s
    .reset_password(token, PasswordChange::new("again-secret", "again-secret"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidResetToken));
}

#[tokio::test]
async fn expired_reset_token_is_not_found() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();

  r.password_reset_token = Some(hash_reset_token("stale"));
  r.password_reset_expires = Some(Utc::now() - TimeDelta::minutes(1));
  s.store_reset_token(&r).await.unwrap();

  assert!(s.find_by_reset_token("stale").await.unwrap().is_none());
  let err = s
    .reset_password(
      "stale".into(),
      PasswordChange::new("whatever-1", "whatever-1"),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidResetToken));
}

#[tokio::test]
async fn stale_save_cannot_revive_a_redeemed_token() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();
  let token = r.generate_password_reset_token();
  s.store_reset_token(&r).await.unwrap();

  let mut stale = s.get(r.shareholder_id).await.unwrap().unwrap();
  assert!(stale.password_reset_token.is_some());

  s.reset_password(
    token.clone(),
    PasswordChange::new("first-secret", "first-secret"),
  )
  .await
  .unwrap();

  stale.shareholding = 42.0;
  let saved = s.save(&stale).await.unwrap();
  assert_eq!(saved.shareholding, 42.0);
  assert!(saved.password_reset_token.is_none());
  assert!(saved.password_reset_expires.is_none());

  let err = s
    .reset_password(
      token,
      PasswordChange::new("second-secret", "second-secret"),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidResetToken));
  let creds = s.credentials(r.shareholder_id).await.unwrap().unwrap();
  assert!(verify_password("first-secret", &creds.password_hash));
}

#[tokio::test]
async fn save_ignores_reset_token_fields() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();
  let token = r.generate_password_reset_token();

  s.save(&r).await.unwrap();
  assert!(s.find_by_reset_token(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn store_reset_token_skips_deactivated_accounts() {
  let s = store().await;
  let mut r = s.register(grace()).await.unwrap();
  s.set_active(r.shareholder_id, false).await.unwrap();

  r.generate_password_reset_token();
  let err = s.store_reset_token(&r).await.unwrap_err();
  assert!(matches!(err, Error::ShareholderNotFound(_)));
}

#[tokio::test]
async fn unknown_reset_token_is_not_found() {
  let s = store().await;
  s.register(grace()).await.unwrap();
  assert!(s.find_by_reset_token("deadbeef").await.unwrap().is_none());
}

// ─── News ────────────────────────────────────────────────────────────────────

fn news(title: &str, days_ago: i64) -> NewBusinessNews {
  NewBusinessNews {
    title:   Some(title.into()),
    summary: Some(format!("{title} summary")),
    date:    Some(Utc::now() - TimeDelta::days(days_ago)),
    image:   Some(format!("uploads/news/{days_ago}.png")),
  }
}

#[tokio::test]
async fn publish_and_list_newest_first() {
  let s = store().await;
  s.publish(news("AGM notice", 10)).await.unwrap();
  s.publish(news("Dividend", 1)).await.unwrap();
  s.publish(news("Board change", 5)).await.unwrap();

  let listed = s.list_news().await.unwrap();
  let titles: Vec<_> = listed.iter().map(|n| n.title.as_str()).collect();
  assert_eq!(titles, ["Dividend", "Board change", "AGM notice"]);
}

#[tokio::test]
async fn publish_rejects_missing_image() {
  let s = store().await;
  let mut input = news("AGM notice", 0);
  input.image = None;

  let err = s.publish(input).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::MissingRequiredField {
      field:   "image",
      message: "Please provide an image",
    })
  ));
}

#[tokio::test]
async fn update_and_delete_news() {
  let s = store().await;
  let published = s.publish(news("AGM notice", 3)).await.unwrap();

  let updated = s
    .update_news(published.news_id, news("AGM notice (revised)", 2))
    .await
    .unwrap();
  let fetched = s.get_news(published.news_id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);
  assert_eq!(fetched.title, "AGM notice (revised)");

  s.delete_news(published.news_id).await.unwrap();
  assert!(s.get_news(published.news_id).await.unwrap().is_none());

  let err = s.delete_news(published.news_id).await.unwrap_err();
  assert!(matches!(err, Error::NewsNotFound(_)));
  let err = s
    .update_news(published.news_id, news("gone", 0))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NewsNotFound(_)));
}

// ─── Orders ──────────────────────────────────────────────────────────────────

async fn insert_order(s: &SqliteStore, shareholder_id: Uuid, minutes_ago: i64) {
  let order_id = Uuid::new_v4().to_string();
  let holder = shareholder_id.to_string();
  let placed = encode_dt(Utc::now() - TimeDelta::minutes(minutes_ago));
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO orders (order_id, shareholder_id, placed_at, details)
         VALUES (?1, ?2, ?3, '{\"units\": 10}')",
        rusqlite::params![order_id, holder, placed],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn orders_are_scoped_to_the_shareholder() {
  let s = store().await;
  let holder = s.register(grace()).await.unwrap();
  let other = s
    .register(registration("other@example.com", "555-987-6543"))
    .await
    .unwrap();

  insert_order(&s, holder.shareholder_id, 5).await;
  insert_order(&s, holder.shareholder_id, 30).await;
  insert_order(&s, other.shareholder_id, 1).await;

  let orders = s.orders_for(holder.shareholder_id).await.unwrap();
  assert_eq!(orders.len(), 2);
  assert!(orders.iter().all(|o| o.shareholder_id == holder.shareholder_id));
  assert!(orders[0].placed_at < orders[1].placed_at);
  assert_eq!(orders[0].details["units"], 10);

  assert!(s.orders_for(Uuid::new_v4()).await.unwrap().is_empty());
}
