//! Bounded LRU map shared between tasks.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// An [`LruCache`] behind a [`Mutex`]. Reads refresh recency, so even `get`
/// needs the lock exclusively.
pub struct BoundedLru<K: Hash + Eq, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V: Clone> BoundedLru<K, V> {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// Lookup without touching recency.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }

    /// Insert or overwrite. Returns the entry evicted to make room, if any.
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        let mut cache = self.inner.lock();
        if cache.contains(&key) {
            cache.put(key, value);
            return None;
        }
        cache.push(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().pop(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let lru = BoundedLru::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        // Touch "a" so "b" becomes the eviction candidate.
        assert_eq!(lru.get(&"a"), Some(1));
        let evicted = lru.put("c", 3);
        assert_eq!(evicted, Some(("b", 2)));
        assert_eq!(lru.get(&"b"), None);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let lru = BoundedLru::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        assert_eq!(lru.put("a", 10), None);
        assert_eq!(lru.get(&"a"), Some(10));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_peek_keeps_order() {
        let lru = BoundedLru::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        assert_eq!(lru.peek(&"a"), Some(1));
        lru.put("c", 3);
        assert_eq!(lru.peek(&"a"), None);
    }

    #[test]
    fn test_zero_capacity_raised() {
        let lru: BoundedLru<u8, u8> = BoundedLru::new(0);
        assert_eq!(lru.capacity(), 1);
    }
}
