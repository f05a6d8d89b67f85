//! Bounded in-process order cache.
//!
//! Maps `order_uid` to the order's serialized JSON. The cache holds at most
//! `capacity` entries and evicts in insertion order (FIFO): when a new key
//! arrives at capacity, the oldest-inserted key is dropped. Reads never
//! change eviction order, and overwriting an existing key keeps its original
//! position.
//!
//! The cache is populated only by successful store writes and by startup
//! restoration; the read path never fills it on a miss.

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fixed-capacity FIFO cache of serialized orders.
///
/// Cheaply cloneable; clones share the same storage.
#[derive(Clone)]
pub struct OrderCache {
    inner: Arc<Mutex<CacheInner>>,
    capacity: NonZeroUsize,
}

struct CacheInner {
    /// Keys, oldest first.
    order: VecDeque<String>,
    entries: HashMap<String, String>,
}

impl OrderCache {
    /// Create an empty cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                order: VecDeque::with_capacity(capacity.get()),
                entries: HashMap::with_capacity(capacity.get()),
            })),
            capacity,
        }
    }

    /// Insert or overwrite `key`.
    ///
    /// An existing key is updated in place. A new key at capacity first
    /// evicts the oldest-inserted entry.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut inner = self.lock();

        if let Some(existing) = inner.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        if inner.entries.len() >= self.capacity.get()
            && let Some(oldest) = inner.order.pop_front()
        {
            inner.entries.remove(&oldest);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key, value);
    }

    /// Look up `key` without affecting eviction order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    // Every critical section is a handful of map/deque operations on owned
    // strings, so a panic elsewhere cannot leave the data half-updated.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for OrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use super::*;

    fn cache(capacity: usize) -> OrderCache {
        OrderCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_set_and_get() {
        let c = cache(2);
        c.set("key1", "value1");
        assert_eq!(c.get("key1").as_deref(), Some("value1"));
    }

    #[test]
    fn test_get_missing_key() {
        let c = cache(2);
        assert_eq!(c.get("nonexistent"), None);
        assert!(c.is_empty());
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let c = cache(2);
        c.set("a", "1");
        c.set("b", "2");
        c.set("c", "3");

        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("b").as_deref(), Some("2"));
        assert_eq!(c.get("c").as_deref(), Some("3"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_get_does_not_refresh_position() {
        let c = cache(3);
        c.set("key1", "value1");
        c.set("key2", "value2");
        c.set("key3", "value3");

        // Reading key1 would save it under LRU; FIFO still evicts it.
        assert!(c.get("key1").is_some());
        c.set("key4", "value4");

        assert_eq!(c.get("key1"), None);
        assert_eq!(c.get("key4").as_deref(), Some("value4"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let c = cache(2);
        c.set("a", "1");
        c.set("b", "2");
        c.set("a", "updated");

        assert_eq!(c.get("a").as_deref(), Some("updated"));
        assert_eq!(c.len(), 2);

        // "a" is still the oldest insertion, so it goes first.
        c.set("c", "3");
        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("b").as_deref(), Some("2"));
        assert_eq!(c.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let c = cache(2);
        c.set("key1", "value1");
        c.set("key2", "value2");
        c.set("key2", "new_value");

        assert_eq!(c.get("key1").as_deref(), Some("value1"));
        assert_eq!(c.get("key2").as_deref(), Some("new_value"));
    }

    #[test]
    fn test_retains_latest_capacity_keys() {
        let c = cache(5);
        for i in 0..50 {
            c.set(format!("k{i}"), i.to_string());
        }

        assert_eq!(c.len(), 5);
        for i in 0..45 {
            assert_eq!(c.get(&format!("k{i}")), None, "k{i} should be evicted");
        }
        for i in 45..50 {
            assert_eq!(c.get(&format!("k{i}")), Some(i.to_string()));
        }
    }

    #[test]
    fn test_reinserting_evicted_key_is_newest() {
        let c = cache(2);
        c.set("a", "1");
        c.set("b", "2");
        c.set("c", "3"); // evicts a
        c.set("a", "4"); // evicts b, a is now newest

        assert_eq!(c.get("b"), None);
        assert_eq!(c.get("c").as_deref(), Some("3"));
        assert_eq!(c.get("a").as_deref(), Some("4"));
    }

    #[test]
    fn test_capacity_one() {
        let c = cache(1);
        c.set("a", "1");
        c.set("b", "2");
        assert_eq!(c.get("a"), None);
        assert_eq!(c.get("b").as_deref(), Some("2"));
        assert_eq!(c.capacity().get(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let c = cache(2);
        let other = c.clone();
        other.set("a", "1");
        assert_eq!(c.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_concurrent_writers_respect_capacity() {
        let c = cache(16);
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let c = c.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        c.set(format!("t{t}-{i}"), "v");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(c.len(), 16);
    }
}
