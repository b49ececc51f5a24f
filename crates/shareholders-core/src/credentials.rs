//! Password and reset-token primitives.
//!
//! Passwords are stored as Argon2id PHC strings (adaptive, salted, slow).
//! Reset tokens are random and short-lived, so a single SHA-256 pass over the
//! hex form is all that is persisted.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::Deserialize;
use sha2::{Digest as _, Sha256};

use crate::{Error, Result};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Number of random bytes behind each reset token.
pub const RESET_TOKEN_BYTES: usize = 32;

/// How long a freshly issued reset token stays redeemable.
pub const RESET_TOKEN_TTL: TimeDelta = TimeDelta::minutes(10);

/// `password_changed_at` is back-dated by this much so a token issued while
/// the save was in flight is not treated as stale.
pub const PASSWORD_CHANGE_BACKDATE: TimeDelta = TimeDelta::seconds(1);

// ─── Password hashing ────────────────────────────────────────────────────────

/// Hash `password` into an Argon2id PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hashing(e.to_string()))
}

/// Compare a plaintext candidate against a stored PHC string.
///
/// The digest comparison inside argon2 is constant-time. A stored value that
/// does not parse as a PHC string never verifies.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(stored_hash) else {
    tracing::warn!("stored password hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(candidate.as_bytes(), &parsed)
    .is_ok()
}

// ─── Reset tokens ────────────────────────────────────────────────────────────

/// SHA-256 of a plaintext reset token, hex-encoded. This is the only form
/// of the token that is ever stored or looked up.
pub fn hash_reset_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// A freshly issued reset token: the plaintext goes to the user, the rest
/// goes on the record.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
  pub token:      String,
  pub token_hash: String,
  pub expires_at: DateTime<Utc>,
}

/// Draw a new token from the OS CSPRNG.
pub fn issue_reset_token(now: DateTime<Utc>) -> IssuedResetToken {
  let mut bytes = [0u8; RESET_TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  let token = hex::encode(bytes);
  IssuedResetToken {
    token_hash: hash_reset_token(&token),
    token,
    expires_at: now + RESET_TOKEN_TTL,
  }
}

// ─── Password writes ─────────────────────────────────────────────────────────

/// A plaintext password plus its confirmation, as submitted by a user.
///
/// This type is consumed by [`PasswordChange::prepare`]; the confirmation has
/// no field on any persisted type, so it cannot reach storage.
#[derive(Clone, Deserialize)]
pub struct PasswordChange {
  pub password:         String,
  pub password_confirm: String,
}

impl std::fmt::Debug for PasswordChange {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PasswordChange").finish_non_exhaustive()
  }
}

/// The credential columns produced by a password write.
#[derive(Debug, Clone)]
pub struct PreparedPassword {
  pub password_hash:       String,
  /// `None` on the first save of a record (registration).
  pub password_changed_at: Option<DateTime<Utc>>,
}

impl PasswordChange {
  pub fn new(password: impl Into<String>, confirm: impl Into<String>) -> Self {
    Self {
      password:         password.into(),
      password_confirm: confirm.into(),
    }
  }

  /// Validate, hash, drop the confirmation, and compute the change
  /// timestamp, in one step.
  pub fn prepare(
    self,
    first_save: bool,
    now: DateTime<Utc>,
  ) -> Result<PreparedPassword> {
    if self.password.is_empty() {
      return Err(Error::MissingRequiredField {
        field:   "password",
        message: "Please provide a password",
      });
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(Error::FormatValidation {
        field:   "password",
        message: format!(
          "Password must be at least {MIN_PASSWORD_LEN} characters"
        ),
      });
    }
    if self.password_confirm.is_empty() {
      return Err(Error::MissingRequiredField {
        field:   "password_confirm",
        message: "Please confirm your password",
      });
    }
    if self.password_confirm != self.password {
      return Err(Error::ConfirmationMismatch);
    }

    let password_hash = hash_password(&self.password)?;
    let password_changed_at =
      (!first_save).then(|| now - PASSWORD_CHANGE_BACKDATE);

    Ok(PreparedPassword {
      password_hash,
      password_changed_at,
    })
  }
}
