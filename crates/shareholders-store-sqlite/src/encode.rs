//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (nanosecond
//! precision, `Z` suffix) so that lexical order matches time order. The
//! embedded next-of-kin record is stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use shareholders_core::{
  news::BusinessNews,
  order::Order,
  shareholder::{NextOfKin, Role, Shareholder},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "shareholder" => Ok(Role::Shareholder),
    other => Err(Error::UnknownRole(other.to_owned())),
  }
}

// ─── NextOfKin ───────────────────────────────────────────────────────────────

pub fn encode_next_of_kin(kin: Option<&NextOfKin>) -> Result<Option<String>> {
  Ok(kin.map(serde_json::to_string).transpose()?)
}

fn decode_next_of_kin(s: Option<String>) -> Result<Option<NextOfKin>> {
  Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawShareholder::from_row`], in order.
pub const SHAREHOLDER_COLUMNS: &str = "shareholder_id, name, address, \
  is_login_activated, email, phone_number, proof_of_identity, \
  proof_of_address, next_of_kin, created_at, password_changed_at, \
  password_reset_token, password_reset_expires, role, active, shareholding, \
  image";

/// Raw values read directly from a `shareholders` row. The password hash is
/// deliberately absent.
pub struct RawShareholder {
  pub shareholder_id:         String,
  pub name:                   String,
  pub address:                String,
  pub is_login_activated:     bool,
  pub email:                  String,
  pub phone_number:           String,
  pub proof_of_identity:      String,
  pub proof_of_address:       String,
  pub next_of_kin:            Option<String>,
  pub created_at:             String,
  pub password_changed_at:    Option<String>,
  pub password_reset_token:   Option<String>,
  pub password_reset_expires: Option<String>,
  pub role:                   String,
  pub active:                 bool,
  pub shareholding:           f64,
  pub image:                  Option<String>,
}

impl RawShareholder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      shareholder_id:         row.get(0)?,
      name:                   row.get(1)?,
      address:                row.get(2)?,
      is_login_activated:     row.get(3)?,
      email:                  row.get(4)?,
      phone_number:           row.get(5)?,
      proof_of_identity:      row.get(6)?,
      proof_of_address:       row.get(7)?,
      next_of_kin:            row.get(8)?,
      created_at:             row.get(9)?,
      password_changed_at:    row.get(10)?,
      password_reset_token:   row.get(11)?,
      password_reset_expires: row.get(12)?,
      role:                   row.get(13)?,
      active:                 row.get(14)?,
      shareholding:           row.get(15)?,
      image:                  row.get(16)?,
    })
  }

  pub fn into_shareholder(self) -> Result<Shareholder> {
    Ok(Shareholder {
      shareholder_id:         decode_uuid(&self.shareholder_id)?,
      name:                   self.name,
      address:                self.address,
      is_login_activated:     self.is_login_activated,
      email:                  self.email,
      phone_number:           self.phone_number,
      proof_of_identity:      self.proof_of_identity,
      proof_of_address:       self.proof_of_address,
      next_of_kin:            decode_next_of_kin(self.next_of_kin)?,
      created_at:             decode_dt(&self.created_at)?,
      password_changed_at:    decode_opt_dt(self.password_changed_at)?,
      password_reset_token:   self.password_reset_token,
      password_reset_expires: decode_opt_dt(self.password_reset_expires)?,
      role:                   decode_role(&self.role)?,
      active:                 self.active,
      shareholding:           self.shareholding,
      image:                  self.image,
    })
  }
}

/// Raw strings read directly from a `business_news` row.
pub struct RawNews {
  pub news_id: String,
  pub title:   String,
  pub summary: String,
  pub date:    String,
  pub image:   String,
}

impl RawNews {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      news_id: row.get(0)?,
      title:   row.get(1)?,
      summary: row.get(2)?,
      date:    row.get(3)?,
      image:   row.get(4)?,
    })
  }

  pub fn into_news(self) -> Result<BusinessNews> {
    Ok(BusinessNews {
      news_id: decode_uuid(&self.news_id)?,
      title:   self.title,
      summary: self.summary,
      date:    decode_dt(&self.date)?,
      image:   self.image,
    })
  }
}

/// Raw strings read directly from an `orders` row.
pub struct RawOrder {
  pub order_id:       String,
  pub shareholder_id: String,
  pub placed_at:      String,
  pub details:        String,
}

impl RawOrder {
  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:       decode_uuid(&self.order_id)?,
      shareholder_id: decode_uuid(&self.shareholder_id)?,
      placed_at:      decode_dt(&self.placed_at)?,
      details:        serde_json::from_str(&self.details)?,
    })
  }
}
