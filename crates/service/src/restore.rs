//! Startup cache restoration.
//!
//! Runs once, before the consumer starts, and fills the cache from every
//! order in the store. When the store holds more orders than the cache can,
//! only the last `capacity` orders in iteration order survive; that order is
//! whatever the store returns, not creation time.
//!
//! Restoration never blocks startup: if the store read fails the service
//! starts with an empty cache and fills it from new messages.

use tracing::{info, warn};

use crate::cache::OrderCache;
use crate::db::OrderStore;

/// What restoration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Orders read from the store.
    pub loaded: usize,
    /// Entries in the cache afterwards.
    pub cached: usize,
}

/// Load every stored order into the cache.
pub async fn restore_cache<S: OrderStore>(store: &S, cache: &OrderCache) -> RestoreSummary {
    info!("Restoring cache from database");

    let orders = match store.load_all().await {
        Ok(orders) => orders,
        Err(e) => {
            warn!(error = %e, "Failed to restore cache from database, starting empty");
            return RestoreSummary::default();
        }
    };

    for (uid, order) in &orders {
        match serde_json::to_string(order) {
            Ok(json) => cache.set(uid.as_str(), json),
            Err(e) => warn!(order_uid = %uid, error = %e, "Skipping unencodable order"),
        }
    }

    let summary = RestoreSummary {
        loaded: orders.len(),
        cached: cache.len(),
    };
    info!(
        loaded = summary.loaded,
        cached = summary.cached,
        capacity = cache.capacity().get(),
        "Cache restored"
    );
    summary
}
