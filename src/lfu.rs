//! Least Frequently Used (LFU) Cache Implementation
//!
//! Evicts the entry that has been accessed the fewest times when a new key
//! arrives at a full table. Access counts live in an indexed
//! [`PriorityQueue`](crate::heap::PriorityQueue) whose weight is the count, so
//! the eviction victim is always the heap root and bumping a count is a single
//! O(log n) re-heapify.
//!
//! ```text
//!   set(new)  ──► full? ──yes──► pop root (fewest accesses) ──► push(key, weight = 1)
//!   get(hit)  ──► weight += 1, fix
//!   set(old)  ──► weight += 1, fix, rewrite value
//! ```
//!
//! Ties between equal counts are broken by heap position, not by age.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `get` / `set` / `remove` | O(log n) |
//! | `get_all` / `purge_expired` | O(n) / O(n log n) |
//!
//! # Thread Safety
//!
//! The heap is guarded by a `parking_lot::Mutex`; values are read and written
//! under each entry's own lock after the heap has been updated.

use crate::codec::StoredValue;
use crate::config::CacheConfig;
use crate::entry::{EntryRead, ExpiringEntry};
use crate::error::Result;
use crate::heap::PriorityQueue;
use crate::metrics::{cache_report, CacheMetrics, EngineCounters};
use crate::traits::Cache;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

type FrequencyQueue<K, V, S> = PriorityQueue<K, Arc<ExpiringEntry<V>>, S>;

/// A thread-safe LFU cache with optional per-entry expiration.
///
/// # Examples
///
/// ```
/// use localcache::{Cache, CacheConfig, EvictionPolicy, LfuCache};
/// use core::num::NonZeroUsize;
///
/// let cache: LfuCache<&str, i32> = LfuCache::init(CacheConfig {
///     capacity: NonZeroUsize::new(2),
///     policy: EvictionPolicy::Lfu,
///     ..CacheConfig::default()
/// });
///
/// cache.set("hot", 1).unwrap();
/// cache.set("cold", 2).unwrap();
/// cache.get(&"hot").unwrap();
/// cache.get(&"hot").unwrap();
///
/// // "cold" has the lowest access count and makes room.
/// cache.set("new", 3).unwrap();
/// assert!(cache.has(&"hot"));
/// assert!(!cache.has(&"cold"));
/// ```
pub struct LfuCache<K, V, S = DefaultHashBuilder> {
    config: CacheConfig<K, V>,
    queue: Mutex<FrequencyQueue<K, V, S>>,
    counters: EngineCounters,
}

impl<K: Hash + Eq + Clone, V: Clone> LfuCache<K, V> {
    /// Creates a cache from `config`. The policy field is not consulted.
    pub fn init(config: CacheConfig<K, V>) -> Self {
        Self::with_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher> LfuCache<K, V, S> {
    /// Creates a cache from `config` with a custom hash builder.
    pub fn with_hasher(config: CacheConfig<K, V>, hash_builder: S) -> Self {
        Self {
            queue: Mutex::new(PriorityQueue::with_hasher(hash_builder)),
            config,
            counters: EngineCounters::new(),
        }
    }

    /// Configured capacity; 0 when unbounded.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity_or_zero()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Removes every expired entry, returning how many were dropped.
    ///
    /// The expire callback is not invoked for entries purged here.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut queue = self.queue.lock();
        let expired: Vec<K> = queue
            .iter()
            .filter(|item| item.value.is_expired(now))
            .map(|item| item.key().clone())
            .collect();
        for key in &expired {
            queue.remove(key);
        }
        drop(queue);

        if !expired.is_empty() {
            self.counters.record_expirations(expired.len() as u64);
            debug!(purged = expired.len(), "purged expired entries");
        }
        expired.len()
    }

    /// Current access count of `key`, if present.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.queue.lock().get(key).map(|item| item.weight)
    }
}

impl<K, V, S> Cache<K, V> for LfuCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn set(&self, key: K, value: V) -> Result<()> {
        let echo = self.config.echo_for_add(&value);
        let stored = self.config.store(value)?;
        let ttl = self.config.expiration;

        let mut queue = self.queue.lock();
        if let Some(entry) = queue.get(&key).map(|item| Arc::clone(&item.value)) {
            queue.increment(&key);
            // Written before the heap lock drops; `get` must not remove the
            // slot on its old deadline.
            entry.write(stored, ttl);
            drop(queue);
        } else {
            if let Some(capacity) = self.config.capacity {
                let now = Instant::now();
                let (mut evicted, mut expired) = (0u64, 0u64);
                while queue.len() >= capacity.get() {
                    let Some(victim) = queue.pop() else {
                        break;
                    };
                    if victim.value.is_expired(now) {
                        expired += 1;
                    } else {
                        evicted += 1;
                    }
                }
                if expired > 0 {
                    self.counters.record_expirations(expired);
                }
                if evicted > 0 {
                    self.counters.record_evictions(evicted);
                    debug!(evicted, capacity = capacity.get(), "evicted least frequently used");
                }
            }
            queue.push(key.clone(), Arc::new(ExpiringEntry::new(stored, ttl)), 1);
            drop(queue);
        }
        trace!("lfu set");
        self.config.notify_added(&key, echo);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let now = Instant::now();
        let read = {
            let mut queue = self.queue.lock();
            match queue.get(key).map(|item| item.value.read(now)) {
                Some(EntryRead::Live(stored)) => {
                    queue.increment(key);
                    Some(EntryRead::Live(stored))
                }
                Some(EntryRead::Expired(stored)) => {
                    queue.remove(key);
                    Some(EntryRead::Expired(stored))
                }
                None => None,
            }
        };

        match read {
            None => {
                self.config.record_lookup(false);
                Ok(None)
            }
            Some(EntryRead::Live(stored)) => {
                let value = self.config.load(&stored);
                self.config.record_lookup(value.is_ok());
                trace!(hit = value.is_ok(), "lfu get");
                value.map(Some)
            }
            Some(EntryRead::Expired(stored)) => {
                self.counters.record_expirations(1);
                self.config.record_lookup(false);
                self.config.notify_expired(key, &stored);
                trace!("lfu get found expired entry");
                Ok(None)
            }
        }
    }

    fn remove(&self, key: &K) -> bool {
        let removed = self.queue.lock().remove(key).is_some();
        trace!(removed, "lfu remove");
        removed
    }

    fn get_all(&self) -> Result<std::collections::HashMap<K, V>> {
        let now = Instant::now();
        let snapshot: Vec<(K, StoredValue<V>)> = self
            .queue
            .lock()
            .iter()
            .filter_map(|item| item.value.live_value(now).map(|stored| (item.key().clone(), stored)))
            .collect();

        snapshot
            .into_iter()
            .map(|(key, stored)| self.config.load(&stored).map(|value| (key, value)))
            .collect()
    }

    fn key_count(&self) -> usize {
        self.queue.lock().len()
    }

    fn has(&self, key: &K) -> bool {
        let now = Instant::now();
        self.queue
            .lock()
            .get(key)
            .map_or(false, |item| !item.value.is_expired(now))
    }
}

impl<K: Hash + Eq + Clone, V: Clone, S: BuildHasher> CacheMetrics for LfuCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        cache_report(
            self.queue.lock().len(),
            self.capacity(),
            &self.counters,
            self.config.register.as_deref(),
        )
    }

    fn algorithm_name(&self) -> &'static str {
        "LFU"
    }
}

impl<K: Hash + Eq + Clone, V, S: BuildHasher> fmt::Debug for LfuCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("len", &self.queue.lock().len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::num::NonZeroUsize;
    use parking_lot::Mutex as PlMutex;
    use std::thread::sleep;
    use std::time::Duration;

    fn make_lfu(cap: usize) -> LfuCache<String, i32> {
        LfuCache::init(CacheConfig {
            capacity: NonZeroUsize::new(cap),
            ..CacheConfig::default()
        })
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_lfu_basic_operations() {
        let cache = make_lfu(3);
        cache.set(key("a"), 1).unwrap();
        cache.set(key("b"), 2).unwrap();

        assert_eq!(cache.get(&key("a")).unwrap(), Some(1));
        assert_eq!(cache.get(&key("b")).unwrap(), Some(2));
        assert_eq!(cache.get(&key("c")).unwrap(), None);
        assert_eq!(cache.key_count(), 2);
    }

    #[test]
    fn test_lfu_evicts_least_frequently_read() {
        let cache = make_lfu(2);
        cache.set(key("popular"), 1).unwrap();
        cache.set(key("rare"), 2).unwrap();
        for _ in 0..3 {
            cache.get(&key("popular")).unwrap();
        }
        cache.get(&key("rare")).unwrap();

        cache.set(key("fresh"), 3).unwrap();
        assert!(cache.has(&key("popular")));
        assert!(!cache.has(&key("rare")));
        assert!(cache.has(&key("fresh")));
        assert_eq!(cache.key_count(), 2);
        assert_eq!(cache.metrics()["evictions"], 1.0);
    }

    #[test]
    fn test_lfu_frequency_tracking() {
        let cache = make_lfu(4);
        cache.set(key("a"), 1).unwrap();
        assert_eq!(cache.frequency(&key("a")), Some(1));

        cache.get(&key("a")).unwrap();
        cache.get(&key("a")).unwrap();
        assert_eq!(cache.frequency(&key("a")), Some(3));

        // Updates count as accesses too.
        cache.set(key("a"), 10).unwrap();
        assert_eq!(cache.frequency(&key("a")), Some(4));
        assert_eq!(cache.get(&key("a")).unwrap(), Some(10));

        // Misses do not create entries.
        cache.get(&key("zz")).unwrap();
        assert_eq!(cache.frequency(&key("zz")), None);
    }

    #[test]
    fn test_lfu_update_never_evicts() {
        let cache = make_lfu(2);
        cache.set(key("a"), 1).unwrap();
        cache.set(key("b"), 2).unwrap();
        cache.set(key("b"), 3).unwrap();
        cache.set(key("a"), 4).unwrap();
        assert_eq!(cache.key_count(), 2);
        assert_eq!(cache.metrics()["evictions"], 0.0);
    }

    #[test]
    fn test_lfu_remove() {
        let cache = make_lfu(2);
        cache.set(key("a"), 1).unwrap();
        assert!(cache.remove(&key("a")));
        assert!(!cache.remove(&key("a")));
        assert_eq!(cache.key_count(), 0);
    }

    #[test]
    fn test_lfu_expired_entry_is_removed_on_get() {
        let seen = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cache: LfuCache<String, i32> = LfuCache::init(CacheConfig {
            capacity: NonZeroUsize::new(4),
            expiration: Some(Duration::from_millis(20)),
            on_expire: Some(Arc::new(move |k: &String, v: &i32| {
                sink.lock().push((k.clone(), *v));
            })),
            ..CacheConfig::default()
        });

        cache.set(key("a"), 5).unwrap();
        sleep(Duration::from_millis(40));

        assert!(!cache.has(&key("a")));
        assert_eq!(cache.get(&key("a")).unwrap(), None);
        assert_eq!(cache.key_count(), 0);
        assert_eq!(*seen.lock(), vec![(key("a"), 5)]);
    }

    #[test]
    fn test_lfu_set_on_expired_key_revives_it() {
        let cache: LfuCache<String, i32> = LfuCache::init(CacheConfig {
            capacity: NonZeroUsize::new(4),
            expiration: Some(Duration::from_millis(20)),
            ..CacheConfig::default()
        });

        cache.set(key("k"), 1).unwrap();
        sleep(Duration::from_millis(40));
        cache.set(key("k"), 2).unwrap();

        assert!(cache.has(&key("k")));
        assert_eq!(cache.get(&key("k")).unwrap(), Some(2));
        assert_eq!(cache.key_count(), 1);
    }

    #[test]
    fn test_lfu_expired_root_is_not_counted_as_eviction() {
        let cache: LfuCache<String, i32> = LfuCache::init(CacheConfig {
            capacity: NonZeroUsize::new(1),
            expiration: Some(Duration::from_millis(20)),
            ..CacheConfig::default()
        });

        cache.set(key("a"), 1).unwrap();
        sleep(Duration::from_millis(40));
        cache.set(key("b"), 2).unwrap();
        cache.set(key("c"), 3).unwrap();

        let metrics = cache.metrics();
        assert_eq!(metrics["expirations"], 1.0);
        assert_eq!(metrics["evictions"], 1.0);
        assert_eq!(cache.get(&key("c")).unwrap(), Some(3));
    }

    #[test]
    fn test_lfu_purge_and_get_all() {
        let cache: LfuCache<String, i32> = LfuCache::init(CacheConfig {
            expiration: Some(Duration::from_millis(20)),
            ..CacheConfig::default()
        });
        cache.set(key("a"), 1).unwrap();
        cache.set(key("b"), 2).unwrap();
        sleep(Duration::from_millis(40));
        cache.set(key("c"), 3).unwrap();

        let all = cache.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("c"), Some(&3));

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.key_count(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_lfu_with_json_codec() {
        let cache: LfuCache<String, Vec<u32>> = LfuCache::init(CacheConfig {
            codec: Some(crate::codec::json()),
            ..CacheConfig::default()
        });
        cache.set(key("v"), vec![1, 2, 3]).unwrap();
        assert_eq!(cache.get(&key("v")).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_lfu_clear_and_metrics() {
        let cache = make_lfu(3);
        cache.set(key("a"), 1).unwrap();
        cache.set(key("b"), 2).unwrap();
        assert_eq!(cache.metrics()["len"], 2.0);
        assert_eq!(cache.algorithm_name(), "LFU");

        cache.clear();
        assert_eq!(cache.key_count(), 0);
        assert_eq!(cache.capacity(), 3);
    }
}
