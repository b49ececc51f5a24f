//! [`NewsStore`] for [`SqliteStore`].

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use shareholders_core::{
  news::{BusinessNews, NewBusinessNews},
  store::NewsStore,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawNews, encode_dt, encode_uuid},
};

impl NewsStore for SqliteStore {
  type Error = Error;

  async fn publish(&self, input: NewBusinessNews) -> Result<BusinessNews> {
    let news = input.into_news(Uuid::new_v4())?;

    let id_str   = encode_uuid(news.news_id);
    let title    = news.title.clone();
    let summary  = news.summary.clone();
    let date_str = encode_dt(news.date);
    let image    = news.image.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO business_news (news_id, title, summary, date, image)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, title, summary, date_str, image],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(news_id = %news.news_id, "published business news");
    Ok(news)
  }

  async fn get_news(&self, id: Uuid) -> Result<Option<BusinessNews>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNews> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT news_id, title, summary, date, image
             FROM business_news WHERE news_id = ?1",
            rusqlite::params![id_str],
            RawNews::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawNews::into_news).transpose()
  }

  async fn list_news(&self) -> Result<Vec<BusinessNews>> {
    let raws: Vec<RawNews> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT news_id, title, summary, date, image
           FROM business_news ORDER BY date DESC, news_id",
        )?;
        let rows = stmt
          .query_map([], RawNews::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNews::into_news).collect()
  }

  async fn update_news(
    &self,
    id: Uuid,
    input: NewBusinessNews,
  ) -> Result<BusinessNews> {
    let news = input.into_news(id)?;

    let id_str   = encode_uuid(id);
    let title    = news.title.clone();
    let summary  = news.summary.clone();
    let date_str = encode_dt(news.date);
    let image    = news.image.clone();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE business_news
           SET title = ?2, summary = ?3, date = ?4, image = ?5
           WHERE news_id = ?1",
          rusqlite::params![id_str, title, summary, date_str, image],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::NewsNotFound(id));
    }
    Ok(news)
  }

  async fn delete_news(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM business_news WHERE news_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::NewsNotFound(id));
    }
    tracing::info!(news_id = %id, "deleted business news");
    Ok(())
  }
}
