//! [`OrderBook`] for [`SqliteStore`]: a read-only view over the `orders`
//! table maintained by the Orders service.

use uuid::Uuid;

use shareholders_core::{order::Order, store::OrderBook};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawOrder, encode_uuid},
};

impl OrderBook for SqliteStore {
  type Error = Error;

  async fn orders_for(&self, shareholder_id: Uuid) -> Result<Vec<Order>> {
    let id_str = encode_uuid(shareholder_id);

    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT order_id, shareholder_id, placed_at, details
           FROM orders WHERE shareholder_id = ?1
           ORDER BY placed_at, order_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawOrder {
              order_id:       row.get(0)?,
              shareholder_id: row.get(1)?,
              placed_at:      row.get(2)?,
              details:        row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }
}
