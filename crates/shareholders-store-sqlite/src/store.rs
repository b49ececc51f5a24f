//! [`SqliteStore`] — the SQLite implementation of [`ShareholderStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value};
use uuid::Uuid;

use shareholders_core::{
  credentials::{PasswordChange, PreparedPassword, hash_reset_token},
  shareholder::{NewShareholder, Shareholder},
  store::{ShareholderQuery, ShareholderStore, StoredCredentials},
};

use crate::{
  Error, Result,
  encode::{
    RawShareholder, SHAREHOLDER_COLUMNS, encode_dt, encode_next_of_kin,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A shareholder registry backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a shareholder SELECT built by [`build_select`].
  async fn select_shareholders(
    &self,
    conds: Conditions,
    visibility: Visibility,
    page: Page,
  ) -> Result<Vec<Shareholder>> {
    let (sql, values) =
      build_select(SHAREHOLDER_COLUMNS, conds, visibility, page);
    tracing::trace!(%sql, "selecting shareholders");

    let raws: Vec<RawShareholder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values), RawShareholder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShareholder::into_shareholder).collect()
  }

  async fn select_one(
    &self,
    conds: Conditions,
    visibility: Visibility,
  ) -> Result<Option<Shareholder>> {
    let mut found = self
      .select_shareholders(conds, visibility, Page::one())
      .await?;
    Ok(found.pop())
  }

  /// Write a prepared password, optionally consuming a reset token in the
  /// same statement. Returns the number of rows updated.
  async fn write_password(
    &self,
    id: Uuid,
    prepared: PreparedPassword,
    consumed_token: Option<String>,
  ) -> Result<usize> {
    let id_str = encode_uuid(id);
    let changed_str = prepared.password_changed_at.map(encode_dt);
    let hash = prepared.password_hash;

    let updated = self
      .conn
      .call(move |conn| {
        let n = match consumed_token {
          None => conn.execute(
            "UPDATE shareholders
             SET password_hash = ?1, password_changed_at = ?2
             WHERE shareholder_id = ?3 AND active IS NOT 0",
            rusqlite::params![hash, changed_str, id_str],
          )?,
          Some(token_hash) => conn.execute(
            "UPDATE shareholders
             SET password_hash = ?1, password_changed_at = ?2,
                 password_reset_token = NULL, password_reset_expires = NULL
             WHERE shareholder_id = ?3 AND active IS NOT 0
               AND password_reset_token = ?4",
            rusqlite::params![hash, changed_str, id_str, token_hash],
          )?,
        };
        Ok(n)
      })
      .await?;
    Ok(updated)
  }
}

// ─── Query building ──────────────────────────────────────────────────────────

/// Which accounts a read may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visibility {
  /// Soft-deleted accounts are filtered out. Every ordinary read uses this.
  ActiveOnly,
  /// Soft-deleted accounts are included. Only explicit callers use this.
  IncludeInactive,
}

/// The soft-delete filter: `active` is not explicitly false.
const ACTIVE_ONLY: &str = "active IS NOT 0";

/// AND-ed WHERE clauses, each with exactly one `?` placeholder.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
  clauses: Vec<&'static str>,
  values:  Vec<Value>,
}

impl Conditions {
  fn new() -> Self { Self::default() }

  fn and(mut self, clause: &'static str, value: impl Into<Value>) -> Self {
    self.clauses.push(clause);
    self.values.push(value.into());
    self
  }

  fn from_query(query: &ShareholderQuery) -> Self {
    let mut conds = Self::new();
    if let Some(email) = &query.email {
      conds = conds.and("email = ?", email.to_lowercase());
    }
    if let Some(phone) = &query.phone_number {
      conds = conds.and("phone_number = ?", phone.clone());
    }
    if let Some(activated) = query.is_login_activated {
      conds = conds.and("is_login_activated = ?", activated);
    }
    if let Some(fragment) = &query.name_contains {
      conds = conds.and(
        "LOWER(name) LIKE ? ESCAPE '\\'",
        format!("%{}%", escape_like(&fragment.to_lowercase())),
      );
    }
    conds
  }
}

/// Escape LIKE wildcards so a fragment only ever matches literally.
fn escape_like(fragment: &str) -> String {
  let mut out = String::with_capacity(fragment.len());
  for c in fragment.chars() {
    if matches!(c, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Page {
  limit:  Option<usize>,
  offset: Option<usize>,
}

impl Page {
  fn one() -> Self {
    Self {
      limit:  Some(1),
      offset: None,
    }
  }

  fn of(query: &ShareholderQuery) -> Self {
    Self {
      limit:  query.limit,
      offset: query.offset,
    }
  }
}

/// Build a SELECT over `shareholders`. This is the single place the
/// soft-delete filter is applied; every shareholder read goes through it.
pub(crate) fn build_select(
  columns: &str,
  conds: Conditions,
  visibility: Visibility,
  page: Page,
) -> (String, Vec<Value>) {
  let Conditions {
    mut clauses,
    mut values,
  } = conds;
  if visibility == Visibility::ActiveOnly {
    clauses.push(ACTIVE_ONLY);
  }

  let where_clause = if clauses.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", clauses.join(" AND "))
  };

  // SQLite treats a negative LIMIT as "no limit".
  values.push(Value::Integer(page.limit.map_or(-1, |l| l as i64)));
  values.push(Value::Integer(page.offset.unwrap_or(0) as i64));

  let sql = format!(
    "SELECT {columns} FROM shareholders {where_clause}
     ORDER BY created_at, shareholder_id
     LIMIT ? OFFSET ?"
  );
  (sql, values)
}

// ─── ShareholderStore impl ───────────────────────────────────────────────────

impl ShareholderStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn register(&self, input: NewShareholder) -> Result<Shareholder> {
    let now = Utc::now();
    let (mut record, change) = input.into_parts(Uuid::new_v4(), now);
    let password = record.prepare_for_persistence(change, true, now)?;

    let id_str        = encode_uuid(record.shareholder_id);
    let name          = record.name.clone();
    let address       = record.address.clone();
    let activated     = record.is_login_activated;
    let email         = record.email.clone();
    let phone_number  = record.phone_number.clone();
    let identity      = record.proof_of_identity.clone();
    let proof_address = record.proof_of_address.clone();
    let kin_str       = encode_next_of_kin(record.next_of_kin.as_ref())?;
    let hash          = password.password_hash;
    let created_str   = encode_dt(record.created_at);
    let role_str      = record.role.as_str();
    let shareholding  = record.shareholding;
    let image         = record.image.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shareholders (
             shareholder_id, name, address, is_login_activated, email,
             phone_number, proof_of_identity, proof_of_address, next_of_kin,
             password_hash, created_at, role, active, shareholding, image
           ) VALUES (
             ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13, ?14
           )",
          rusqlite::params![
            id_str,
            name,
            address,
            activated,
            email,
            phone_number,
            identity,
            proof_address,
            kin_str,
            hash,
            created_str,
            role_str,
            shareholding,
            image,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)?;

    tracing::info!(
      shareholder_id = %record.shareholder_id,
      "registered shareholder"
    );
    Ok(record)
  }

  async fn save(&self, record: &Shareholder) -> Result<Shareholder> {
    let mut record = record.clone();
    record.validate()?;

    let id            = record.shareholder_id;
    let id_str        = encode_uuid(id);
    let name          = record.name;
    let address       = record.address;
    let activated     = record.is_login_activated;
    let email         = record.email;
    let phone_number  = record.phone_number;
    let identity      = record.proof_of_identity;
    let proof_address = record.proof_of_address;
    let kin_str       = encode_next_of_kin(record.next_of_kin.as_ref())?;
    let shareholding  = record.shareholding;
    let image         = record.image;

    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE shareholders SET
             name = ?2, address = ?3, is_login_activated = ?4, email = ?5,
             phone_number = ?6, proof_of_identity = ?7, proof_of_address = ?8,
             next_of_kin = ?9, shareholding = ?10, image = ?11
           WHERE shareholder_id = ?1 AND active IS NOT 0",
          rusqlite::params![
            id_str,
            name,
            address,
            activated,
            email,
            phone_number,
            identity,
            proof_address,
            kin_str,
            shareholding,
            image,
          ],
        )?;
        Ok(n)
      })
      .await
      .map_err(Error::from_write)?;

    if updated == 0 {
      return Err(Error::ShareholderNotFound(id));
    }
    tracing::debug!(shareholder_id = %id, "saved shareholder");

    self.get(id).await?.ok_or(Error::ShareholderNotFound(id))
  }

  async fn store_reset_token(&self, record: &Shareholder) -> Result<()> {
    let id = record.shareholder_id;
    let id_str = encode_uuid(id);
    let token_hash = record.password_reset_token.clone();
    let expires = record.password_reset_expires.map(encode_dt);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shareholders
           SET password_reset_token = ?1, password_reset_expires = ?2
           WHERE shareholder_id = ?3 AND active IS NOT 0",
          rusqlite::params![token_hash, expires, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ShareholderNotFound(id));
    }
    tracing::info!(shareholder_id = %id, "reset token stored");
    Ok(())
  }

  async fn change_password(
    &self,
    id: Uuid,
    change: PasswordChange,
  ) -> Result<Shareholder> {
    let mut record =
      self.get(id).await?.ok_or(Error::ShareholderNotFound(id))?;
    let prepared =
      record.prepare_for_persistence(change, false, Utc::now())?;

    if self.write_password(id, prepared, None).await? == 0 {
      return Err(Error::ShareholderNotFound(id));
    }
    tracing::info!(shareholder_id = %id, "password changed");
    Ok(record)
  }

  async fn reset_password(
    &self,
    token: String,
    change: PasswordChange,
  ) -> Result<Shareholder> {
    let mut record = self
      .find_by_reset_token(&token)
      .await?
      .ok_or(Error::InvalidResetToken)?;
    let prepared =
      record.prepare_for_persistence(change, false, Utc::now())?;

    // Matching on the token hash makes a concurrent second redemption a no-op.
    let id = record.shareholder_id;
    let updated = self
      .write_password(id, prepared, Some(hash_reset_token(&token)))
      .await?;
    if updated == 0 {
      return Err(Error::InvalidResetToken);
    }

    record.password_reset_token = None;
    record.password_reset_expires = None;
    tracing::info!(shareholder_id = %id, "password reset");
    Ok(record)
  }

  async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(id);
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE shareholders SET active = ?1 WHERE shareholder_id = ?2",
          rusqlite::params![active, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ShareholderNotFound(id));
    }
    tracing::info!(shareholder_id = %id, active, "activity changed");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: Uuid) -> Result<Option<Shareholder>> {
    let conds = Conditions::new().and("shareholder_id = ?", encode_uuid(id));
    self.select_one(conds, Visibility::ActiveOnly).await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Shareholder>> {
    let conds = Conditions::new().and("email = ?", email.to_lowercase());
    self.select_one(conds, Visibility::ActiveOnly).await
  }

  async fn find_active(
    &self,
    query: &ShareholderQuery,
  ) -> Result<Vec<Shareholder>> {
    self
      .select_shareholders(
        Conditions::from_query(query),
        Visibility::ActiveOnly,
        Page::of(query),
      )
      .await
  }

  async fn find_including_inactive(
    &self,
    query: &ShareholderQuery,
  ) -> Result<Vec<Shareholder>> {
    self
      .select_shareholders(
        Conditions::from_query(query),
        Visibility::IncludeInactive,
        Page::of(query),
      )
      .await
  }

  async fn credentials(&self, id: Uuid) -> Result<Option<StoredCredentials>> {
    let conds = Conditions::new().and("shareholder_id = ?", encode_uuid(id));
    let (sql, values) = build_select(
      "password_hash",
      conds,
      Visibility::ActiveOnly,
      Page::one(),
    );

    let hash: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, params_from_iter(values), |row| row.get(0))
          .optional()?)
      })
      .await?;

    Ok(hash.map(|password_hash| StoredCredentials {
      shareholder_id: id,
      password_hash,
    }))
  }

  async fn find_by_reset_token(
    &self,
    token: &str,
  ) -> Result<Option<Shareholder>> {
    let token_hash = hash_reset_token(token);
    let conds = Conditions::new().and("password_reset_token = ?", token_hash);
    let found = self.select_one(conds, Visibility::ActiveOnly).await?;
    Ok(found.filter(|record| record.reset_token_live_at(Utc::now())))
  }
}
