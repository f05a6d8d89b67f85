//! Per-message ingestion: validate, persist, then cache.
//!
//! ```text
//! Received ──decode──► Validated ──persist──► Persisted ──set──► Cached ──► Acknowledged
//!     │                    │                      │
//!     └─ Rejected          └─ Rejected            └─ PersistFailed
//!       (malformed)          (empty order_uid)
//! ```
//!
//! Every failure is terminal for the message: it is logged and dropped,
//! never retried. The cache entry for an order is written only after the
//! store transaction has committed.

use thiserror::Error;
use tracing::{error, info, warn};

use order_hub_core::{Order, OrderUid};

use crate::cache::OrderCache;
use crate::db::{OrderStore, RepositoryError};

/// Reasons a message did not reach the cache.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Payload is not a JSON order document.
    #[error("malformed order payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Payload decoded but carries no `order_uid`.
    #[error("order has an empty order_uid")]
    MissingOrderUid,

    /// The store transaction failed; nothing was written.
    #[error("failed to persist order {order_uid}: {source}")]
    Persist {
        order_uid: OrderUid,
        #[source]
        source: RepositoryError,
    },

    /// The order was stored but could not be serialized for the cache.
    #[error("failed to encode order {order_uid} for cache: {source}")]
    Encode {
        order_uid: OrderUid,
        #[source]
        source: serde_json::Error,
    },
}

/// Terminal state of a processed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stored and cached.
    Cached(OrderUid),
    /// Dropped before reaching the store.
    Rejected,
    /// Dropped because the store write (or cache encoding) failed.
    PersistFailed,
}

/// The validate → persist → cache pipeline.
pub struct Pipeline<S> {
    store: S,
    cache: OrderCache,
}

impl<S: OrderStore> Pipeline<S> {
    #[must_use]
    pub const fn new(store: S, cache: OrderCache) -> Self {
        Self { store, cache }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn cache(&self) -> &OrderCache {
        &self.cache
    }

    /// Run one message through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the [`IngestError`] for the state the message stopped in.
    pub async fn handle(&self, payload: &[u8]) -> Result<OrderUid, IngestError> {
        let order: Order = serde_json::from_slice(payload).map_err(IngestError::Malformed)?;
        let uid = order.uid().map_err(|_| IngestError::MissingOrderUid)?;

        if let Err(source) = self.store.persist(&order).await {
            return Err(IngestError::Persist {
                order_uid: uid,
                source,
            });
        }

        let json = match serde_json::to_string(&order) {
            Ok(json) => json,
            Err(source) => {
                return Err(IngestError::Encode {
                    order_uid: uid,
                    source,
                });
            }
        };
        self.cache.set(uid.as_str(), json);

        Ok(uid)
    }

    /// Run one message through the pipeline and log how it ended.
    pub async fn process(&self, payload: &[u8]) -> Outcome {
        match self.handle(payload).await {
            Ok(uid) => {
                info!(order_uid = %uid, "Order processed and cached");
                Outcome::Cached(uid)
            }
            Err(e @ (IngestError::Malformed(_) | IngestError::MissingOrderUid)) => {
                warn!(error = %e, bytes = payload.len(), "Rejected order message");
                Outcome::Rejected
            }
            Err(e @ (IngestError::Persist { .. } | IngestError::Encode { .. })) => {
                error!(error = %e, "Dropped order message");
                Outcome::PersistFailed
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    use super::*;

    /// Store that records persisted uids and can be told to fail.
    #[derive(Default)]
    struct RecordingStore {
        persisted: Mutex<Vec<String>>,
        fail: bool,
    }

    impl OrderStore for RecordingStore {
        async fn persist(&self, order: &Order) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
            }
            self.persisted.lock().unwrap().push(order.order_uid.clone());
            Ok(())
        }

        async fn load_all(&self) -> Result<HashMap<String, Order>, RepositoryError> {
            Ok(HashMap::new())
        }
    }

    fn pipeline(fail: bool) -> Pipeline<RecordingStore> {
        let store = RecordingStore {
            fail,
            ..RecordingStore::default()
        };
        Pipeline::new(store, OrderCache::new(NonZeroUsize::new(4).unwrap()))
    }

    #[tokio::test]
    async fn test_valid_order_is_stored_then_cached() {
        let p = pipeline(false);
        let payload = br#"{"order_uid": "o1", "track_number": "T", "items": []}"#;

        assert_eq!(
            p.process(payload).await,
            Outcome::Cached(OrderUid::parse("o1").unwrap())
        );
        assert_eq!(*p.store().persisted.lock().unwrap(), vec!["o1".to_string()]);

        let cached: Order = serde_json::from_str(&p.cache().get("o1").unwrap()).unwrap();
        assert_eq!(cached.track_number, "T");
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let p = pipeline(false);

        assert!(matches!(
            p.handle(b"not json").await,
            Err(IngestError::Malformed(_))
        ));
        assert_eq!(p.process(b"{").await, Outcome::Rejected);
        assert!(p.store().persisted.lock().unwrap().is_empty());
        assert!(p.cache().is_empty());
    }

    #[tokio::test]
    async fn test_empty_uid_never_reaches_store_or_cache() {
        let p = pipeline(false);

        assert!(matches!(
            p.handle(br#"{"order_uid": ""}"#).await,
            Err(IngestError::MissingOrderUid)
        ));
        assert_eq!(p.process(br#"{"entry": "WBIL"}"#).await, Outcome::Rejected);
        assert!(p.store().persisted.lock().unwrap().is_empty());
        assert!(p.cache().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let p = pipeline(true);

        let err = p.handle(br#"{"order_uid": "o1"}"#).await.unwrap_err();
        assert!(matches!(err, IngestError::Persist { .. }));
        assert_eq!(
            p.process(br#"{"order_uid": "o1"}"#).await,
            Outcome::PersistFailed
        );
        assert_eq!(p.cache().get("o1"), None);
    }

    #[tokio::test]
    async fn test_redelivery_overwrites_cached_value() {
        let p = pipeline(false);
        p.process(br#"{"order_uid": "o1", "locale": "en"}"#).await;
        p.process(br#"{"order_uid": "o1", "locale": "ru"}"#).await;

        let cached: Order = serde_json::from_str(&p.cache().get("o1").unwrap()).unwrap();
        assert_eq!(cached.locale, "ru");
        assert_eq!(p.cache().len(), 1);
    }
}
