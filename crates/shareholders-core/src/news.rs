//! Business news announcements. Plain data; no lifecycle of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, validate::required};

/// A published announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessNews {
  pub news_id: Uuid,
  pub title:   String,
  pub summary: String,
  pub date:    DateTime<Utc>,
  /// File reference for the header image.
  pub image:   String,
}

/// Input to [`crate::store::NewsStore::publish`] and
/// [`crate::store::NewsStore::update`]; every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewBusinessNews {
  pub title:   Option<String>,
  pub summary: Option<String>,
  pub date:    Option<DateTime<Utc>>,
  pub image:   Option<String>,
}

impl NewBusinessNews {
  pub fn into_news(self, news_id: Uuid) -> Result<BusinessNews> {
    Ok(BusinessNews {
      news_id,
      title: required(self.title, "title", "Please provide a title.")?,
      summary: required(self.summary, "summary", "Please provide a summary")?,
      date: self.date.ok_or(Error::MissingRequiredField {
        field:   "date",
        message: "Please provide a date",
      })?,
      image: required(self.image, "image", "Please provide an image")?,
    })
  }
}
