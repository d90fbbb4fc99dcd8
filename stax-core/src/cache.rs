//! Memoized markdown exports

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use crate::slug::SlugPath;

/// Cache key: tree revision + document path
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct ExportKey {
    pub revision: u64,
    pub path: SlugPath,
}

/// LRU cache of markdown exports.
///
/// Keys carry the tree revision, so an export computed against a replaced
/// tree is never returned for the new one.
pub struct ExportCache {
    cache: Option<Mutex<LruCache<ExportKey, Arc<str>>>>,
}

impl ExportCache {
    /// Create a cache; a capacity of 0 disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Return the cached export or compute, store and return it.
    ///
    /// Errors from `compute` are never cached.
    pub fn get_or_try_insert<E>(
        &self,
        key: ExportKey,
        compute: impl FnOnce() -> Result<String, E>,
    ) -> Result<Arc<str>, E> {
        let Some(cache) = &self.cache else {
            return compute().map(Arc::from);
        };

        if let Some(hit) = lock(cache).get(&key) {
            log::debug!("export cache hit for {}", key.path);
            return Ok(Arc::clone(hit));
        }

        // Computed outside the lock; concurrent misses may both compute the same value
        let value: Arc<str> = Arc::from(compute()?);
        lock(cache).put(key, Arc::clone(&value));
        Ok(value)
    }

    /// Drop every entry
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            lock(cache).clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| lock(cache).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A panic while holding the lock leaves the cache usable; entries are immutable
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
