//! Least Recently Used (LRU) Cache Implementation
//!
//! A recency-ordered cache with lazy expiration. Entries live in a hash map
//! for O(1) lookup and in a doubly linked list ordered from most to least
//! recently touched. When a new key pushes the table over capacity, the tail
//! of the list is evicted.
//!
//! # Algorithm
//!
//! ```text
//!   map: key ──► node
//!                 │
//!   list: head ⇄ [MRU] ⇄ [ ] ⇄ [ ] ⇄ [LRU] ⇄ tail
//!                                      ▲
//!                                 evicted first
//! ```
//!
//! Each entry goes through these states:
//!
//! ```text
//!   absent ──set──► front ──get / set──► front ──(tail, over capacity)──► evicted
//!                     │
//!                     └──(deadline passed, found by get)──► expired, removed
//! ```
//!
//! Only the insertion of a brand-new key checks capacity; updating an existing
//! key moves it to the front and never evicts anything.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `get` / `set` / `remove` | O(1) |
//! | `get_all` / `purge_expired` | O(n) |
//!
//! # Thread Safety
//!
//! Moving a node to the front rewires its neighbours, so every list splice
//! happens under one `parking_lot::Mutex` that guards the map and the list
//! together. Value reads and writes go through each entry's own lock; an
//! update to an existing key splices under the table lock, releases it, and
//! only then writes the value.

use crate::codec::StoredValue;
use crate::config::CacheConfig;
use crate::entry::{EntryRead, ExpiringEntry};
use crate::error::Result;
use crate::list::{Entry, List};
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
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

type Node<K, V> = (K, Arc<ExpiringEntry<V>>);

/// Map and recency list, always mutated together under the cache's mutex.
///
/// # Safety
///
/// Every pointer in `map` was returned by `list.push_front` and is removed
/// from the map in the same step that unlinks it from the list.
pub(crate) struct LruTable<K, V, S = DefaultHashBuilder> {
    list: List<Node<K, V>>,
    map: HashMap<K, *mut Entry<Node<K, V>>, S>,
}

// SAFETY: the table owns every node its pointers refer to; nothing else
// aliases them.
unsafe impl<K: Send, V: Send + Sync, S: Send> Send for LruTable<K, V, S> {}

// SAFETY: all mutation requires &mut self, which the owning Mutex serializes.
unsafe impl<K: Sync, V: Send + Sync, S: Sync> Sync for LruTable<K, V, S> {}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> LruTable<K, V, S> {
    pub(crate) fn with_hasher(capacity: usize, hash_builder: S) -> Self {
        LruTable {
            list: List::new(),
            map: HashMap::with_capacity_and_hasher(capacity, hash_builder),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.map.len(), self.list.len());
        self.map.len()
    }

    /// Reads `key` at `now`. A live entry moves to the front; an expired one
    /// is unlinked and its last value handed back.
    pub(crate) fn lookup(&mut self, key: &K, now: Instant) -> Option<EntryRead<V>> {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map.
        let read = unsafe { (*node).get_value().1.read(now) };
        match read {
            EntryRead::Live(_) => {
                // SAFETY: node comes from our map.
                unsafe { self.list.move_to_front(node) };
            }
            EntryRead::Expired(_) => {
                self.unlink(key);
            }
        }
        Some(read)
    }

    /// Moves an existing key to the front and returns its entry.
    pub(crate) fn touch(&mut self, key: &K) -> Option<Arc<ExpiringEntry<V>>> {
        let node = self.map.get(key).copied()?;
        // SAFETY: node comes from our map.
        unsafe {
            self.list.move_to_front(node);
            Some(Arc::clone(&(*node).get_value().1))
        }
    }

    /// Links a new key at the front. The caller has checked it is absent.
    pub(crate) fn insert(&mut self, key: K, entry: Arc<ExpiringEntry<V>>)
    where
        K: Clone,
    {
        let node = self.list.push_front((key.clone(), entry));
        self.map.insert(key, node);
    }

    /// Drops from the back until at most `capacity` keys remain. Returns
    /// `(evicted, expired)`: victims already past their deadline at `now`
    /// are reported as expired rather than evicted.
    pub(crate) fn evict_overflow(&mut self, capacity: usize, now: Instant) -> (usize, usize) {
        let (mut evicted, mut expired) = (0, 0);
        while self.map.len() > capacity {
            let Some(node) = self.list.pop_back() else {
                break;
            };
            // SAFETY: pop_back never yields a sentinel.
            let (key, entry) = unsafe { node.into_value() };
            self.map.remove(&key);
            if entry.is_expired(now) {
                expired += 1;
            } else {
                evicted += 1;
            }
        }
        (evicted, expired)
    }

    /// Removes `key` from both the map and the list.
    pub(crate) fn unlink(&mut self, key: &K) -> bool {
        let Some(node) = self.map.remove(key) else {
            return false;
        };
        // SAFETY: node came from our map and was just removed from it.
        if let Some(boxed) = unsafe { self.list.remove(node) } {
            // SAFETY: list.remove never yields a sentinel.
            drop(unsafe { boxed.into_value() });
        }
        true
    }

    /// Returns `true` if `key` is present and live at `now`, without touching
    /// its recency.
    pub(crate) fn has(&self, key: &K, now: Instant) -> bool {
        match self.map.get(key) {
            // SAFETY: node comes from our map.
            Some(&node) => unsafe { !(*node).get_value().1.is_expired(now) },
            None => false,
        }
    }

    /// Live `(key, value)` pairs in recency order.
    pub(crate) fn snapshot(&self, now: Instant) -> Vec<(K, StoredValue<V>)>
    where
        K: Clone,
    {
        self.list
            .iter()
            .filter_map(|(key, entry)| entry.live_value(now).map(|stored| (key.clone(), stored)))
            .collect()
    }

    /// Unlinks every expired entry.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize
    where
        K: Clone,
    {
        let expired: Vec<K> = self
            .list
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.unlink(key);
        }
        expired.len()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.list.iter().map(|(key, _)| key.clone()).collect()
    }
}

impl<K, V, S> fmt::Debug for LruTable<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruTable")
            .field("len", &self.map.len())
            .finish()
    }
}

/// A thread-safe LRU cache with optional per-entry expiration.
///
/// # Examples
///
/// ```
/// use localcache::{Cache, CacheConfig, LruCache};
/// use core::num::NonZeroUsize;
///
/// let cache: LruCache<&str, &str> = LruCache::init(CacheConfig {
///     capacity: NonZeroUsize::new(2),
///     ..CacheConfig::default()
/// });
///
/// cache.set("key", "aaaaa").unwrap();
/// cache.set("akey", "bbbb").unwrap();
/// cache.set("bkey", "ccccc").unwrap();
///
/// // "key" was the least recently used when "bkey" went in.
/// assert_eq!(cache.get(&"key").unwrap(), None);
/// assert_eq!(cache.get(&"akey").unwrap(), Some("bbbb"));
/// assert_eq!(cache.get(&"bkey").unwrap(), Some("ccccc"));
/// ```
pub struct LruCache<K, V, S = DefaultHashBuilder> {
    config: CacheConfig<K, V>,
    table: Mutex<LruTable<K, V, S>>,
    counters: EngineCounters,
}

impl<K: Hash + Eq, V: Clone> LruCache<K, V> {
    /// Creates a cache from `config`. The policy field is not consulted.
    pub fn init(config: CacheConfig<K, V>) -> Self {
        Self::with_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> LruCache<K, V, S> {
    /// Creates a cache from `config` with a custom hash builder.
    pub fn with_hasher(config: CacheConfig<K, V>, hash_builder: S) -> Self {
        Self {
            table: Mutex::new(LruTable::with_hasher(config.capacity_or_zero(), hash_builder)),
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
        self.table.lock().clear();
    }

    /// Unlinks every expired entry, returning how many were dropped.
    ///
    /// The expire callback is not invoked for entries purged here.
    pub fn purge_expired(&self) -> usize
    where
        K: Clone,
    {
        let purged = self.table.lock().purge_expired(Instant::now());
        if purged > 0 {
            self.counters.record_expirations(purged as u64);
            debug!(purged, "purged expired entries");
        }
        purged
    }
}

impl<K, V, S> Cache<K, V> for LruCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn set(&self, key: K, value: V) -> Result<()> {
        let echo = self.config.echo_for_add(&value);
        let stored = self.config.store(value)?;
        let ttl = self.config.expiration;

        let mut table = self.table.lock();
        if let Some(entry) = table.touch(&key) {
            // Still under the table lock: `lookup` must not unlink the slot
            // between the touch and the new deadline.
            entry.write(stored, ttl);
            drop(table);
        } else {
            table.insert(key.clone(), Arc::new(ExpiringEntry::new(stored, ttl)));
            if let Some(capacity) = self.config.capacity {
                let (evicted, expired) = table.evict_overflow(capacity.get(), Instant::now());
                if expired > 0 {
                    self.counters.record_expirations(expired as u64);
                }
                if evicted > 0 {
                    self.counters.record_evictions(evicted as u64);
                    debug!(evicted, capacity = capacity.get(), "evicted least recently used");
                }
            }
            drop(table);
        }
        trace!("lru set");
        self.config.notify_added(&key, echo);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let read = self.table.lock().lookup(key, Instant::now());
        match read {
            None => {
                self.config.record_lookup(false);
                Ok(None)
            }
            Some(EntryRead::Live(stored)) => {
                let value = self.config.load(&stored);
                self.config.record_lookup(value.is_ok());
                trace!(hit = value.is_ok(), "lru get");
                value.map(Some)
            }
            Some(EntryRead::Expired(stored)) => {
                self.counters.record_expirations(1);
                self.config.record_lookup(false);
                self.config.notify_expired(key, &stored);
                trace!("lru get found expired entry");
                Ok(None)
            }
        }
    }

    fn remove(&self, key: &K) -> bool {
        let removed = self.table.lock().unlink(key);
        trace!(removed, "lru remove");
        removed
    }

    fn get_all(&self) -> Result<std::collections::HashMap<K, V>> {
        let snapshot = self.table.lock().snapshot(Instant::now());
        snapshot
            .into_iter()
            .map(|(key, stored)| self.config.load(&stored).map(|value| (key, value)))
            .collect()
    }

    fn key_count(&self) -> usize {
        self.table.lock().len()
    }

    fn has(&self, key: &K) -> bool {
        self.table.lock().has(key, Instant::now())
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> CacheMetrics for LruCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        cache_report(
            self.table.lock().len(),
            self.capacity(),
            &self.counters,
            self.config.register.as_deref(),
        )
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}

impl<K, V, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("table", &*self.table.lock())
            .field("config", &self.config)
            .finish()
    }
}
