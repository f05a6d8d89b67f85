//! Database operations for the order store.
//!
//! # Database: `orders_db`
//!
//! ## Tables
//!
//! - `orders` - Order headers, one row per `order_uid`
//! - `delivery` - Recipient data, one row per `order_uid`
//! - `payment` - Transaction data, one row per `order_uid`
//! - `items` - Purchased lines, zero or more rows per `order_uid`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/service/migrations/` and run via:
//! ```bash
//! cargo run -p order-hub-cli -- migrate
//! ```

pub mod orders;

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use order_hub_core::Order;

use crate::config::DatabaseConfig;

pub use orders::{OrderRepository, RowCounts};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement inside the order write transaction failed; nothing was committed.
    #[error("failed to write {stage}: {source}")]
    Write {
        stage: WriteStage,
        #[source]
        source: sqlx::Error,
    },
}

/// The sub-write of [`OrderStore::persist`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Begin,
    Order,
    Delivery,
    Payment,
    Item { index: usize },
    Commit,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => f.write_str("transaction begin"),
            Self::Order => f.write_str("order header"),
            Self::Delivery => f.write_str("delivery"),
            Self::Payment => f.write_str("payment"),
            Self::Item { index } => write!(f, "item #{index}"),
            Self::Commit => f.write_str("transaction commit"),
        }
    }
}

/// Durable order persistence.
///
/// The ingestion pipeline and cache restoration depend on this trait rather
/// than on [`OrderRepository`] directly, so both can run against an
/// in-memory store in tests.
pub trait OrderStore: Send + Sync {
    /// Write an order and all of its children atomically.
    ///
    /// Header, delivery and payment rows are insert-or-ignore on
    /// `order_uid`. Item rows are always inserted, so persisting the same
    /// order twice duplicates its items.
    fn persist(&self, order: &Order) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Load every stored order, keyed by `order_uid`, with children attached.
    fn load_all(
        &self,
    ) -> impl Future<Output = Result<HashMap<String, Order>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Uses `DATABASE_URL` when configured, otherwise the individual host,
/// port, user, password and database name settings.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the connection cannot be
/// established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options(config)?)
        .await
}

fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, sqlx::Error> {
    if let Some(url) = &config.url {
        return url.expose_secret().parse::<PgConnectOptions>();
    }

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password.expose_secret())
        .database(&config.name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(|u| SecretString::from(u.to_string())),
            host: "db.internal".to_string(),
            port: 6543,
            user: "orders".to_string(),
            password: SecretString::from("pw".to_string()),
            name: "orders_db".to_string(),
        }
    }

    #[test]
    fn test_connect_options_from_parts() {
        let options = connect_options(&config(None)).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "orders");
        assert_eq!(options.get_database(), Some("orders_db"));
    }

    #[test]
    fn test_connect_options_url_wins() {
        let options =
            connect_options(&config(Some("postgres://svc:pw@primary:5432/live"))).unwrap();
        assert_eq!(options.get_host(), "primary");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("live"));
    }

    #[test]
    fn test_write_stage_display() {
        assert_eq!(WriteStage::Delivery.to_string(), "delivery");
        assert_eq!(WriteStage::Item { index: 2 }.to_string(), "item #2");

        let err = RepositoryError::Write {
            stage: WriteStage::Payment,
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(err.to_string().starts_with("failed to write payment"));
    }
}
