//! Field-level validation rules shared by every record type.
//!
//! A value that is absent or the empty string counts as missing. Whitespace
//! is left alone; the stored value is exactly what the caller sent, apart
//! from email lower-casing.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidateEmail as _;

use crate::{Error, Result};

/// Loose phone-number pattern: optional country code, optional separators,
/// optional parentheses around the area code. Unanchored, so any value that
/// contains a match is accepted.
static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:\+?(\d{1,3}))?[\s.-]?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")
    .expect("phone pattern compiles")
});

/// Unwrap a required string, rejecting `None` and `""`.
pub fn required(
  value: Option<String>,
  field: &'static str,
  message: &'static str,
) -> Result<String> {
  match value {
    Some(v) if !v.is_empty() => Ok(v),
    _ => Err(Error::MissingRequiredField { field, message }),
  }
}

/// Check an already-populated string field.
pub fn non_empty(
  value: &str,
  field: &'static str,
  message: &'static str,
) -> Result<()> {
  if value.is_empty() {
    return Err(Error::MissingRequiredField { field, message });
  }
  Ok(())
}

pub fn is_email(value: &str) -> bool { value.to_owned().validate_email() }

pub fn is_phone_number(value: &str) -> bool { PHONE_NUMBER.is_match(value) }

/// Lower-case an email address in place, then check its syntax.
pub fn normalize_email(
  value: &mut String,
  field: &'static str,
  message: &'static str,
) -> Result<()> {
  *value = value.to_lowercase();
  if !is_email(value) {
    return Err(Error::FormatValidation {
      field,
      message: message.to_owned(),
    });
  }
  Ok(())
}

pub fn check_phone_number(value: &str, field: &'static str) -> Result<()> {
  if !is_phone_number(value) {
    return Err(Error::FormatValidation {
      field,
      message: "Please provide a valid phone number".to_owned(),
    });
  }
  Ok(())
}
