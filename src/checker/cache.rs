use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Characters of content that take part in the key.
const KEY_CONTENT_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

/// LRU memoization of check results.
///
/// Every `get` updates recency, so reads lock too. Hit and miss counters are
/// atomics read without the lock.
#[derive(Debug)]
pub struct ResultCache<V> {
    entries: Mutex<LruCache<String, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResultCache<V> {
    /// A zero `max_size` is treated as 1.
    pub fn new(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns a clone of the value and marks the entry most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.lock().get(key).cloned();
        let counter = if value.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Inserting a new key into a full cache evicts the least recently used
    /// entry.
    pub fn set(&self, key: String, value: V) {
        self.entries.lock().put(key, value);
    }

    /// Does not affect recency.
    pub fn has(&self, key: &str) -> bool {
        self.entries.lock().contains(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let (size, max_size) = {
            let entries = self.entries.lock();
            (entries.len(), entries.cap().get())
        };
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };

        CacheStats {
            hits,
            misses,
            size,
            max_size,
            hit_rate,
        }
    }
}

/// Hash of the first 100 characters of `content` plus language and
/// serialized settings. Texts that only differ after character 100 share a
/// key.
pub fn cache_key(content: &str, language: &str, settings: &str) -> String {
    let head: String = content.chars().take(KEY_CONTENT_CHARS).collect();

    let mut hasher = Sha256::new();
    hasher.update(head.as_bytes());
    hasher.update([0]);
    hasher.update(language.as_bytes());
    hasher.update([0]);
    hasher.update(settings.as_bytes());
    format!("{:x}", hasher.finalize())
}
