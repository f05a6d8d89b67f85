//! Order Hub Core - Shared order domain types.
//!
//! This crate provides the order model used across all Order Hub components:
//! - `service` - Bus consumer, order store, bounded cache, and read API
//! - `cli` - Migrations and the one-shot order publisher
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no bus clients. With the `postgres` feature the row types derive
//! `sqlx::FromRow` so the store can decode them directly.
//!
//! # Modules
//!
//! - [`types`] - The order aggregate and the validated [`OrderUid`] key

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
