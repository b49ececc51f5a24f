//! Error type for `shareholders-store-sqlite`.

use rusqlite::ErrorCode;
use shareholders_core::Error as CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] CoreError),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("shareholder not found: {0}")]
  ShareholderNotFound(uuid::Uuid),

  #[error("business news not found: {0}")]
  NewsNotFound(uuid::Uuid),

  /// The submitted reset token matches no active account, or has expired.
  #[error("password reset token is invalid or has expired")]
  InvalidResetToken,
}

impl Error {
  /// Translate a failed shareholder write, turning UNIQUE-constraint
  /// failures into field-specific uniqueness violations.
  pub(crate) fn from_write(err: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      code,
      Some(msg),
    )) = &err
      && code.code == ErrorCode::ConstraintViolation
    {
      for field in ["email", "phone_number"] {
        if msg.contains(&format!("shareholders.{field}")) {
          return Error::Core(CoreError::UniquenessViolation { field });
        }
      }
    }
    Error::Database(err)
  }

  /// The uniqueness-violated field, if this is a uniqueness violation.
  pub fn conflicting_field(&self) -> Option<&'static str> {
    match self {
      Error::Core(CoreError::UniquenessViolation { field }) => Some(*field),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
