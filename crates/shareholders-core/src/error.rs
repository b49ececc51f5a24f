//! Error types for `shareholders-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was absent or empty on write.
  #[error("{field}: {message}")]
  MissingRequiredField {
    field:   &'static str,
    message: &'static str,
  },

  /// A field was present but did not satisfy its format rule.
  #[error("{field}: {message}")]
  FormatValidation {
    field:   &'static str,
    message: String,
  },

  /// Another shareholder already holds this value.
  #[error("a shareholder with this {field} already exists")]
  UniquenessViolation { field: &'static str },

  #[error("password_confirm: Passwords do not match")]
  ConfirmationMismatch,

  #[error("password hashing failed: {0}")]
  Hashing(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
