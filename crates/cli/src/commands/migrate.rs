//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! oh-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! Uses the same database settings as the service: `DATABASE_URL`, or
//! `DB_HOST` / `DB_PORT` / `DB_USER` / `DB_PASSWORD` / `DB_NAME`.
//!
//! # Migration Files
//!
//! Migrations live in `crates/service/migrations/` and are embedded into the
//! service library at compile time.

use tracing::info;

use order_hub_service::config::ServiceConfig;
use order_hub_service::db;

use super::CommandError;

/// Run all pending order store migrations.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let config = ServiceConfig::from_env()?;

    info!("Connecting to order database...");
    let pool = db::create_pool(&config.database).await?;

    info!("Running order migrations...");
    db::MIGRATOR.run(&pool).await?;

    pool.close().await;
    info!("Order migrations complete!");
    Ok(())
}
