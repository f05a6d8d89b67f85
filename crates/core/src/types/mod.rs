//! Core types for Order Hub.
//!
//! This module provides the order aggregate as it travels over the bus and
//! a type-safe wrapper for the order identifier.

pub mod order;
pub mod order_uid;

pub use order::{Delivery, Item, Order, Payment};
pub use order_uid::{OrderUid, OrderUidError};
