//! Read-through cache for store lookups keyed by student or opening.
//!
//! Entries live until invalidated or until the least recently used entry is evicted to stay
//! within capacity. The selection service invalidates after every write it performs; writes
//! made elsewhere must call the service's `invalidate_*` methods.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

/// Entries kept per cache unless a capacity is given.
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug)]
pub struct ReadThroughCache<K: Hash + Eq, V> {
    entries: Mutex<LruCache<K, V>>,
}

impl<K: Hash + Eq, V> Default for ReadThroughCache<K, V> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<K: Hash + Eq, V> ReadThroughCache<K, V> {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, or run `load` and cache its successful result.
    ///
    /// The lock is not held while loading, so two concurrent misses may both hit the store.
    pub fn get_or_load<E, F>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.lock().get(key) {
            return Ok(value.clone());
        }

        let value = load()?;
        self.lock().put(key.clone(), value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        self.lock().pop(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn loads_once_until_invalidated() {
        let cache: ReadThroughCache<String, u32> = ReadThroughCache::new();
        let loads = Cell::new(0);
        let load = || -> Result<u32, ()> {
            loads.set(loads.get() + 1);
            Ok(7)
        };

        assert_eq!(cache.get_or_load(&"st-1".to_string(), load), Ok(7));
        assert_eq!(cache.get_or_load(&"st-1".to_string(), load), Ok(7));
        assert_eq!(loads.get(), 1);

        cache.invalidate(&"st-1".to_string());
        assert_eq!(cache.get_or_load(&"st-1".to_string(), load), Ok(7));
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache: ReadThroughCache<u8, u8> = ReadThroughCache::new();
        assert_eq!(cache.get_or_load(&1, || Err::<u8, _>("offline")), Err("offline"));
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_load(&1, || Ok::<_, &str>(3)), Ok(3));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted_at_capacity() {
        let capacity = NonZeroUsize::new(2).expect("non-zero");
        let cache: ReadThroughCache<&str, u32> = ReadThroughCache::with_capacity(capacity);
        let loads = Cell::new(0);
        let load = |value: u32| {
            loads.set(loads.get() + 1);
            Ok::<_, ()>(value)
        };

        assert_eq!(cache.get_or_load(&"st-1", || load(1)), Ok(1));
        assert_eq!(cache.get_or_load(&"st-2", || load(2)), Ok(2));
        assert_eq!(cache.get_or_load(&"st-1", || load(1)), Ok(1));
        assert_eq!(cache.get_or_load(&"st-3", || load(3)), Ok(3));
        assert_eq!(loads.get(), 3);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get_or_load(&"st-1", || load(1)), Ok(1));
        assert_eq!(loads.get(), 3);
        assert_eq!(cache.get_or_load(&"st-2", || load(2)), Ok(2));
        assert_eq!(loads.get(), 4);
    }

    #[test]
    fn default_capacity_bounds_the_cache() {
        let cache: ReadThroughCache<u8, u8> = ReadThroughCache::new();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }
}
