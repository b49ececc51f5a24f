//! Read-only view of the external Orders collection.
//!
//! Orders are owned by another service. This crate only ever reads the
//! orders that point at a shareholder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:       Uuid,
  pub shareholder_id: Uuid,
  pub placed_at:      DateTime<Utc>,
  /// Order payload as the Orders service wrote it.
  pub details:        serde_json::Value,
}
