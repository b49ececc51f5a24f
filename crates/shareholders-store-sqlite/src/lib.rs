//! SQLite backend for the shareholder registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements every
//! store trait from `shareholders-core`.

mod encode;
mod news;
mod orders;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
