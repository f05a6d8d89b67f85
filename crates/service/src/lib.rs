//! Order Hub service library.
//!
//! This crate provides the order service as a library, allowing the
//! pipeline, cache and router to be tested and reused outside the binary.
//!
//! # Data flow
//!
//! ```text
//! NATS ──► ingest::Pipeline ──► db::OrderStore (commit) ──► cache::OrderCache
//!                                                              ▲
//!                       restore::restore_cache (startup) ──────┤
//!                                                              │
//!                                  routes (GET /order/{id}) ───┘ reads only
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod restore;
pub mod routes;
pub mod state;
