//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::OrderCache;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The read API only ever
/// touches the cache; the pool is here for the readiness probe.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    cache: OrderCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `pool` - `PostgreSQL` connection pool
    /// * `cache` - Order cache shared with the ingestion pipeline
    #[must_use]
    pub fn new(pool: PgPool, cache: OrderCache) -> Self {
        Self {
            inner: Arc::new(AppStateInner { pool, cache }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order cache.
    #[must_use]
    pub fn cache(&self) -> &OrderCache {
        &self.inner.cache
    }
}
