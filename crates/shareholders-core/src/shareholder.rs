//! The shareholder account record.
//!
//! [`NewShareholder`] is the registration input: every field is optional so
//! that a missing value surfaces as a validation error naming the field
//! rather than a deserialisation failure. [`Shareholder`] is the persisted
//! read model; it never carries the password hash (see
//! [`crate::store::ShareholderStore::credentials`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  credentials::{PasswordChange, PreparedPassword, issue_reset_token},
  validate::{check_phone_number, non_empty, normalize_email},
};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Account role. Shareholder accounts have exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Shareholder,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Shareholder => "shareholder",
    }
  }
}

// ─── Next of kin ─────────────────────────────────────────────────────────────

/// Embedded next-of-kin details; owned by exactly one shareholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOfKin {
  pub name:    String,
  pub email:   String,
  pub address: String,
}

impl NextOfKin {
  fn validate(&mut self) -> Result<()> {
    non_empty(
      &self.name,
      "next_of_kin.name",
      "Please provide a next of kin name",
    )?;
    non_empty(
      &self.email,
      "next_of_kin.email",
      "Please provide next of kin email address",
    )?;
    normalize_email(
      &mut self.email,
      "next_of_kin.email",
      "Please provide a valid email address for next of kin",
    )?;
    non_empty(
      &self.address,
      "next_of_kin.address",
      "Please provide next of kin address",
    )
  }
}

// ─── Shareholder ─────────────────────────────────────────────────────────────

fn default_active() -> bool { true }

/// A persisted shareholder account, minus its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shareholder {
  pub shareholder_id:         Uuid,
  pub name:                   String,
  pub address:                String,
  /// Whether this account may authenticate at all.
  pub is_login_activated:     bool,
  /// Lower-cased; unique across all shareholders.
  pub email:                  String,
  /// Unique across all shareholders.
  pub phone_number:           String,
  /// File reference for the identity document.
  pub proof_of_identity:      String,
  /// File reference for the address document.
  pub proof_of_address:       String,
  pub next_of_kin:            Option<NextOfKin>,
  /// Set once by the store; never rewritten.
  pub created_at:             DateTime<Utc>,
  pub password_changed_at:    Option<DateTime<Utc>>,
  /// SHA-256 hex of the outstanding reset token, if any.
  pub password_reset_token:   Option<String>,
  pub password_reset_expires: Option<DateTime<Utc>>,
  pub role:                   Role,
  /// Soft-delete flag. Not part of the serialised projection.
  #[serde(skip, default = "default_active")]
  pub active:                 bool,
  pub shareholding:           f64,
  pub image:                  Option<String>,
}

impl Shareholder {
  /// Enforce required fields and format rules, lower-casing emails in place.
  ///
  /// Errors name the first failing field in declaration order.
  pub fn validate(&mut self) -> Result<()> {
    non_empty(&self.name, "name", "A name is required")?;
    non_empty(&self.address, "address", "Please provide an address")?;
    non_empty(&self.email, "email", "Please provide your email address")?;
    normalize_email(
      &mut self.email,
      "email",
      "Please provide a valid email address",
    )?;
    non_empty(
      &self.phone_number,
      "phone_number",
      "Please provide a phone number",
    )?;
    check_phone_number(&self.phone_number, "phone_number")?;
    non_empty(
      &self.proof_of_identity,
      "proof_of_identity",
      "Please provide a proof of identity",
    )?;
    non_empty(
      &self.proof_of_address,
      "proof_of_address",
      "Please provide a proof of address",
    )?;
    if let Some(kin) = self.next_of_kin.as_mut() {
      kin.validate()?;
    }
    Ok(())
  }

  /// The write-path step run before every password write.
  ///
  /// Validates the record, hashes the password, drops the confirmation and
  /// stamps `password_changed_at` (unless this is the record's first save).
  /// Writes without a password only need [`Shareholder::validate`], which has
  /// no credential side effect.
  pub fn prepare_for_persistence(
    &mut self,
    change: PasswordChange,
    first_save: bool,
    now: DateTime<Utc>,
  ) -> Result<PreparedPassword> {
    self.validate()?;

    let prepared = change.prepare(first_save, now)?;
    if prepared.password_changed_at.is_some() {
      self.password_changed_at = prepared.password_changed_at;
    }
    Ok(prepared)
  }

  /// True iff the password was changed strictly after `issued_at` (Unix
  /// seconds). Collaborators use this to reject tokens minted before a
  /// password change.
  pub fn was_password_changed_after(&self, issued_at: i64) -> bool {
    self
      .password_changed_at
      .is_some_and(|changed| changed.timestamp() > issued_at)
  }

  /// Issue a new reset token, recording only its hash and expiry on `self`.
  ///
  /// Returns the plaintext token for delivery. The record must be saved by
  /// the caller. Any earlier outstanding token is overwritten.
  pub fn generate_password_reset_token(&mut self) -> String {
    let issued = issue_reset_token(Utc::now());
    self.password_reset_token = Some(issued.token_hash);
    self.password_reset_expires = Some(issued.expires_at);
    issued.token
  }

  /// Whether an outstanding reset token is still redeemable at `now`.
  pub fn reset_token_live_at(&self, now: DateTime<Utc>) -> bool {
    self.password_reset_token.is_some()
      && self.password_reset_expires.is_some_and(|exp| exp > now)
  }
}

// ─── Registration input ──────────────────────────────────────────────────────

/// Input to [`crate::store::ShareholderStore::register`].
///
/// `created_at`, `role`, `active` and the credential timestamps are always
/// set by the store and are not accepted from callers.
#[derive(Default, Clone, Deserialize)]
pub struct NewShareholder {
  pub name:               Option<String>,
  pub address:            Option<String>,
  #[serde(default)]
  pub is_login_activated: bool,
  pub email:              Option<String>,
  pub phone_number:       Option<String>,
  pub proof_of_identity:  Option<String>,
  pub proof_of_address:   Option<String>,
  pub next_of_kin:        Option<NextOfKin>,
  pub password:           Option<String>,
  pub password_confirm:   Option<String>,
  pub shareholding:       Option<f64>,
  pub image:              Option<String>,
}

impl std::fmt::Debug for NewShareholder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NewShareholder")
      .field("name", &self.name)
      .field("email", &self.email)
      .field("phone_number", &self.phone_number)
      .finish_non_exhaustive()
  }
}

impl NewShareholder {
  /// Split the input into an unsaved record and its password write.
  ///
  /// Nothing is checked here. Absent values become empty strings so that
  /// [`Shareholder::prepare_for_persistence`] reports the first failing field
  /// in declaration order, record fields before the password.
  pub fn into_parts(
    self,
    shareholder_id: Uuid,
    now: DateTime<Utc>,
  ) -> (Shareholder, PasswordChange) {
    let record = Shareholder {
      shareholder_id,
      name: self.name.unwrap_or_default(),
      address: self.address.unwrap_or_default(),
      is_login_activated: self.is_login_activated,
      email: self.email.unwrap_or_default(),
      phone_number: self.phone_number.unwrap_or_default(),
      proof_of_identity: self.proof_of_identity.unwrap_or_default(),
      proof_of_address: self.proof_of_address.unwrap_or_default(),
      next_of_kin: self.next_of_kin,
      created_at: now,
      password_changed_at: None,
      password_reset_token: None,
      password_reset_expires: None,
      role: Role::Shareholder,
      active: true,
      shareholding: self.shareholding.unwrap_or(0.0),
      image: self.image,
    };
    let change = PasswordChange::new(
      self.password.unwrap_or_default(),
      self.password_confirm.unwrap_or_default(),
    );
    (record, change)
  }
}
