//! CLI subcommand implementations.

pub mod migrate;
pub mod publish;

use order_hub_service::config::ConfigError;
use order_hub_service::ingest::BusError;
use thiserror::Error;

/// Errors from any CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("message bus error: {0}")]
    Bus(#[from] BusError),
}
