//! One-shot order publisher for manual testing.
//!
//! # Usage
//!
//! ```bash
//! # Publish ./model.json to the orders subject
//! oh-cli publish
//!
//! # Publish a specific file
//! oh-cli publish fixtures/order.json
//! ```
//!
//! Uses the service's `NATS_*` settings, with its own connection name.

use std::path::Path;

use tracing::info;

use order_hub_service::config::ServiceConfig;
use order_hub_service::ingest::OrderBus;

use super::CommandError;

/// Read `file` and publish its contents once to the orders subject.
///
/// The file must be valid JSON; it is not checked against the order shape,
/// so malformed orders can be sent on purpose to exercise rejection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON, or if the
/// publish is not acknowledged.
pub async fn run(file: &Path, client_id: &str) -> Result<(), CommandError> {
    let mut config = ServiceConfig::from_env()?;
    config.nats.client_id = client_id.to_string();

    let path = file.display().to_string();
    let payload = tokio::fs::read(file)
        .await
        .map_err(|source| CommandError::Read {
            path: path.clone(),
            source,
        })?;
    serde_json::from_slice::<serde_json::Value>(&payload).map_err(|source| {
        CommandError::InvalidJson {
            path: path.clone(),
            source,
        }
    })?;

    let bus = OrderBus::connect(&config.nats).await?;
    info!(subject = %config.nats.subject, file = %path, "Publishing order...");
    bus.publish(payload).await?;
    bus.close().await;

    info!("Order published!");
    Ok(())
}
