//! Generic LRU+TTL cache.
//!
//! Not concurrency-safe on its own; callers that share one across workers
//! wrap it the way the scheduler wraps its shared registries, with
//! `Arc<Mutex<CacheManager<T>>>`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct Entry<T> {
    value: T,
    created_at: Instant,
}

pub struct CacheManager<T> {
    capacity: usize,
    ttl: Option<Duration>,
    cleanup_interval: Duration,
    last_cleanup: Instant,
    entries: HashMap<String, Entry<T>>,
    /// Most-recently-used at the back.
    order: Vec<String>,
    stats: CacheStats,
}

impl<T> CacheManager<T> {
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, None)
    }

    pub fn with_ttl(capacity: usize, ttl: Option<Duration>) -> Self {
        assert!(capacity >= 1, "CacheManager capacity must be at least 1");
        Self {
            capacity,
            ttl,
            cleanup_interval: Duration::from_secs(60),
            last_cleanup: Instant::now(),
            entries: HashMap::new(),
            order: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &Entry<T>) -> bool {
        match self.ttl {
            Some(ttl) => entry.created_at.elapsed() >= ttl,
            None => false,
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&T> {
        self.maybe_sweep();
        let expired = self
            .entries
            .get(key)
            .map(|e| self.is_expired_snapshot(e))
            .unwrap_or(false);
        if expired {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            return None;
        }
        if self.entries.contains_key(key) {
            self.touch(key);
            self.stats.hits += 1;
            self.entries.get(key).map(|e| &e.value)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    fn is_expired_snapshot(&self, entry: &Entry<T>) -> bool {
        match self.ttl {
            Some(ttl) => entry.created_at.elapsed() >= ttl,
            None => false,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        self.maybe_sweep();
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        self.entries.insert(
            key.clone(),
            Entry {
                value,
                created_at: Instant::now(),
            },
        );
        self.order.push(key);

        while self.entries.len() > self.capacity {
            if self.order.is_empty() {
                break;
            }
            let lru_key = self.order.remove(0);
            self.entries.remove(&lru_key);
            self.stats.evictions += 1;
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.order.retain(|k| k != key);
        self.entries.remove(key).map(|e| e.value)
    }

    /// Evicts every currently expired entry. Driven by `set`/`get`, not a timer,
    /// and runs at most once per `cleanup_interval`.
    fn maybe_sweep(&mut self) {
        if self.ttl.is_none() {
            return;
        }
        if self.last_cleanup.elapsed() < self.cleanup_interval {
            return;
        }
        self.last_cleanup = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired_snapshot(e))
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            self.entries.remove(&key);
            self.order.retain(|k| k != &key);
            self.stats.expirations += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn lru_eviction_drops_least_recently_used() {
        let mut cache = CacheManager::new(2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("a");
        cache.set("c", 3);

        assert!(cache.contains("a"));
        assert!(cache.contains("c"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn ttl_expiration_evicts_on_get() {
        let mut cache = CacheManager::with_ttl(10, Some(Duration::from_millis(50)));
        cache.set("k", 1);
        sleep(Duration::from_millis(100));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn hits_and_misses_are_counted() {
        let mut cache = CacheManager::new(4);
        cache.set("a", 1);
        cache.get("a");
        cache.get("missing");
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }
}
