//! Core types and trait definitions for the shareholder registry.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the record shapes, the write-path validation, and the credential
//! primitives; storage backends implement the traits in [`store`].

pub mod credentials;
pub mod error;
pub mod news;
pub mod order;
pub mod shareholder;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
