//! Unordered-Scan Cache Implementation
//!
//! The simplest policy: a hash table of expiring entries with no recency or
//! frequency bookkeeping. It never displaces a live entry. When a bounded table
//! fills past its load threshold it first reclaims expired entries and, if
//! that is not enough, doubles its capacity.
//!
//! # Algorithm
//!
//! ```text
//!   set(new key) ──► insert ──► len > ⌊capacity × 0.75⌋ ?
//!                                   │ no            │ yes
//!                                   ▼               ▼
//!                                 done     purge expired entries
//!                                                   │
//!                                   still over the threshold ?
//!                                   │ no            │ yes
//!                                   ▼               ▼
//!                                 done     capacity *= 2 (repeat)
//! ```
//!
//! Overflow is absorbed by growing, so without an expiration duration a
//! bounded `SimpleCache` behaves like an unbounded one that reports how large
//! it has become. Use [`LruCache`](crate::LruCache) or
//! [`LfuCache`](crate::LfuCache) for a hard bound.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `get` / `set` (existing key) | O(1), shared table lock |
//! | `set` (new key) | O(1) amortized, exclusive table lock; O(n) when purging |
//! | `remove` | O(1), exclusive table lock |
//! | `get_all` / `purge_expired` | O(n) |
//!
//! # Thread Safety
//!
//! The table sits behind a `parking_lot::RwLock` and every entry carries its
//! own lock. Updating an existing key takes the table lock only long enough to
//! find the entry, so writers to distinct keys proceed in parallel.

use crate::codec::StoredValue;
use crate::config::CacheConfig;
use crate::entry::{EntryRead, ExpiringEntry};
use crate::error::Result;
use crate::metrics::{cache_report, CacheMetrics, EngineCounters};
use crate::traits::Cache;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
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

type Table<K, V, S> = HashMap<K, Arc<ExpiringEntry<V>>, S>;

/// Occupancy above which a new insertion triggers reclaim or growth:
/// ⌊capacity × 0.75⌋, computed without overflowing.
#[inline]
fn load_threshold(capacity: usize) -> usize {
    capacity / 4 * 3 + capacity % 4 * 3 / 4
}

/// A cache that grows instead of evicting live entries.
///
/// # Examples
///
/// ```
/// use localcache::{Cache, CacheConfig, SimpleCache};
/// use core::num::NonZeroUsize;
///
/// let cache: SimpleCache<&str, i32> = SimpleCache::init(CacheConfig {
///     capacity: NonZeroUsize::new(4),
///     ..CacheConfig::default()
/// });
///
/// for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
///     cache.set(key, i as i32).unwrap();
/// }
///
/// // Nothing was evicted; the table doubled instead.
/// assert_eq!(cache.key_count(), 4);
/// assert_eq!(cache.capacity(), 8);
/// ```
pub struct SimpleCache<K, V, S = DefaultHashBuilder> {
    config: CacheConfig<K, V>,
    table: RwLock<Table<K, V, S>>,
    /// Current capacity, 0 when unbounded. Only grows while the table write
    /// lock is held.
    capacity: AtomicUsize,
    counters: EngineCounters,
}

impl<K: Hash + Eq, V: Clone> SimpleCache<K, V> {
    /// Creates a cache from `config`. The policy field is not consulted.
    pub fn init(config: CacheConfig<K, V>) -> Self {
        Self::with_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> SimpleCache<K, V, S> {
    /// Creates a cache from `config` with a custom hash builder.
    pub fn with_hasher(config: CacheConfig<K, V>, hash_builder: S) -> Self {
        let capacity = config.capacity_or_zero();
        Self {
            table: RwLock::new(HashMap::with_capacity_and_hasher(capacity, hash_builder)),
            capacity: AtomicUsize::new(capacity),
            config,
            counters: EngineCounters::new(),
        }
    }

    /// Current capacity; 0 when unbounded. Starts at the configured value and
    /// doubles on growth.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Removes every entry and restores the configured capacity.
    pub fn clear(&self) {
        let mut table = self.table.write();
        table.clear();
        self.capacity
            .store(self.config.capacity_or_zero(), Ordering::Release);
    }

    /// Removes every expired entry, returning how many were dropped.
    ///
    /// The expire callback is not invoked for entries purged here.
    pub fn purge_expired(&self) -> usize {
        let mut table = self.table.write();
        Self::purge_locked(&mut table, &self.counters)
    }

    fn purge_locked(table: &mut Table<K, V, S>, counters: &EngineCounters) -> usize {
        let now = Instant::now();
        let before = table.len();
        table.retain(|_, entry| !entry.is_expired(now));
        let purged = before - table.len();
        if purged > 0 {
            counters.record_expirations(purged as u64);
            debug!(purged, remaining = table.len(), "purged expired entries");
        }
        purged
    }

    /// Applies the load-threshold rule after a new key went in.
    fn reclaim_or_grow(&self, table: &mut Table<K, V, S>) {
        let capacity = self.capacity.load(Ordering::Acquire);
        if capacity == 0 || table.len() <= load_threshold(capacity) {
            return;
        }
        Self::purge_locked(table, &self.counters);

        let mut grown = capacity;
        while table.len() > load_threshold(grown) {
            grown = grown.saturating_mul(2);
            self.counters.record_growth();
        }
        if grown != capacity {
            self.capacity.store(grown, Ordering::Release);
            table.reserve(grown.saturating_sub(table.len()));
            debug!(from = capacity, to = grown, len = table.len(), "grew capacity");
        }
    }

    /// Drops `key` if it still maps to `entry` and that entry is still
    /// expired; a concurrent `set` may have revived or replaced it.
    fn remove_expired_slot(&self, key: &K, entry: &Arc<ExpiringEntry<V>>) -> bool {
        let mut table = self.table.write();
        let same = match table.get(key) {
            Some(current) => Arc::ptr_eq(current, entry) && current.is_expired(Instant::now()),
            None => false,
        };
        if same {
            table.remove(key);
            self.counters.record_expirations(1);
        }
        same
    }
}

impl<K, V, S> Cache<K, V> for SimpleCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Send + Sync,
{
    fn set(&self, key: K, value: V) -> Result<()> {
        let echo = self.config.echo_for_add(&value);
        let stored = self.config.store(value)?;
        let ttl = self.config.expiration;

        // The entry is written while the table guard is held, so an expiry
        // check in `get` never sees the stale deadline of a slot being revived.
        let table = self.table.read();
        let pending = match table.get(&key) {
            Some(entry) => {
                entry.write(stored, ttl);
                None
            }
            None => Some(stored),
        };
        drop(table);
        if let Some(stored) = pending {
            let mut table = self.table.write();
            match table.get(&key) {
                // Lost the race to another inserter; update in place.
                Some(entry) => entry.write(stored, ttl),
                None => {
                    table.insert(key.clone(), Arc::new(ExpiringEntry::new(stored, ttl)));
                    self.reclaim_or_grow(&mut table);
                }
            }
        }
        trace!("simple set");
        self.config.notify_added(&key, echo);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Option<V>> {
        let Some(entry) = self.table.read().get(key).cloned() else {
            self.config.record_lookup(false);
            return Ok(None);
        };

        match entry.read(Instant::now()) {
            EntryRead::Live(stored) => {
                let value = self.config.load(&stored);
                self.config.record_lookup(value.is_ok());
                trace!(hit = value.is_ok(), "simple get");
                value.map(Some)
            }
            EntryRead::Expired(stored) => {
                self.remove_expired_slot(key, &entry);
                self.config.record_lookup(false);
                self.config.notify_expired(key, &stored);
                trace!("simple get found expired entry");
                Ok(None)
            }
        }
    }

    fn remove(&self, key: &K) -> bool {
        let removed = self.table.write().remove(key).is_some();
        trace!(removed, "simple remove");
        removed
    }

    fn get_all(&self) -> Result<std::collections::HashMap<K, V>> {
        let now = Instant::now();
        let snapshot: Vec<(K, StoredValue<V>)> = self
            .table
            .read()
            .iter()
            .filter_map(|(key, entry)| entry.live_value(now).map(|stored| (key.clone(), stored)))
            .collect();

        snapshot
            .into_iter()
            .map(|(key, stored)| self.config.load(&stored).map(|value| (key, value)))
            .collect()
    }

    fn key_count(&self) -> usize {
        self.table.read().len()
    }

    fn has(&self, key: &K) -> bool {
        let now = Instant::now();
        self.table
            .read()
            .get(key)
            .map_or(false, |entry| !entry.is_expired(now))
    }
}

impl<K: Hash + Eq, V: Clone, S: BuildHasher> CacheMetrics for SimpleCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        cache_report(
            self.table.read().len(),
            self.capacity(),
            &self.counters,
            self.config.register.as_deref(),
        )
    }

    fn algorithm_name(&self) -> &'static str {
        "SIMPLE"
    }
}

impl<K, V, S> fmt::Debug for SimpleCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCache")
            .field("len", &self.table.read().len())
            .field("capacity", &self.capacity.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish()
    }
}
