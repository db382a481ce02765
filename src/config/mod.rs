//! Cache Configuration Module
//!
//! This module provides the configuration shared by all cache policies.
//!
//! # Design Philosophy
//!
//! [`CacheConfig`] has all public fields for simple instantiation; each cache
//! holds its own copy, read-only after construction. For chained, validated
//! construction use [`CacheBuilder`].
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `capacity` | `None` = unbounded |
//! | `expiration` | `None` = entries never expire; otherwise re-armed on every `set` |
//! | `policy` | which cache [`CacheConfig::build`] produces |
//! | `codec` | serializer/deserializer pair applied around storage |
//! | `on_add` | called with `(key, value)` after a successful `set` |
//! | `on_expire` | called with `(key, value)` when `get` finds an expired entry |
//! | `register` | shared hit/miss [`Register`] |
//!
//! # Examples
//!
//! ```
//! use localcache::config::{CacheConfig, EvictionPolicy};
//! use localcache::LruCache;
//! use core::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! let config = CacheConfig {
//!     capacity: NonZeroUsize::new(1000),
//!     expiration: Some(Duration::from_secs(60)),
//!     policy: EvictionPolicy::Lru,
//!     ..CacheConfig::default()
//! };
//!
//! let cache: LruCache<String, i32> = LruCache::init(config);
//! ```

mod builder;

pub use builder::CacheBuilder;

use crate::codec::{Codec, StoredValue};
use crate::error::{CacheError, Result};
use crate::lfu::LfuCache;
use crate::lru::LruCache;
use crate::metrics::Register;
use crate::simple::SimpleCache;
use crate::traits::Cache;
use core::fmt;
use core::hash::Hash;
use core::num::NonZeroUsize;
use core::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Callback fired after a successful `set` with the caller's key and value.
pub type AddCallback<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Callback fired when `get` discovers an expired entry.
pub type ExpireCallback<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Selects which cache implementation a configuration builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EvictionPolicy {
    /// Unordered map; grows instead of evicting, reclaims only expired entries.
    #[default]
    Simple,
    /// Least recently used entry is evicted on overflow.
    Lru,
    /// Least frequently used entry is evicted on overflow.
    Lfu,
}

impl EvictionPolicy {
    /// The canonical lowercase name accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::Simple => "simple",
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(EvictionPolicy::Simple),
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            _ => Err(CacheError::UnsupportedPolicy(s.to_string())),
        }
    }
}

/// Configuration shared by every cache policy.
pub struct CacheConfig<K, V> {
    /// Maximum number of entries; `None` means unbounded.
    pub capacity: Option<NonZeroUsize>,
    /// Time-to-live applied on every write; `None` means no expiry.
    pub expiration: Option<Duration>,
    /// Cache implementation produced by [`CacheConfig::build`].
    pub policy: EvictionPolicy,
    /// Optional serializer/deserializer pair.
    pub codec: Option<Codec<V>>,
    /// Optional callback fired after each successful `set`.
    pub on_add: Option<AddCallback<K, V>>,
    /// Optional callback fired when `get` finds an expired entry.
    pub on_expire: Option<ExpireCallback<K, V>>,
    /// Optional shared hit/miss register.
    pub register: Option<Arc<Register>>,
}

impl<K, V> Default for CacheConfig<K, V> {
    fn default() -> Self {
        Self {
            capacity: None,
            expiration: None,
            policy: EvictionPolicy::default(),
            codec: None,
            on_add: None,
            on_expire: None,
            register: None,
        }
    }
}

impl<K, V> Clone for CacheConfig<K, V> {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            expiration: self.expiration,
            policy: self.policy,
            codec: self.codec.clone(),
            on_add: self.on_add.clone(),
            on_expire: self.on_expire.clone(),
            register: self.register.clone(),
        }
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("capacity", &self.capacity)
            .field("expiration", &self.expiration)
            .field("policy", &self.policy)
            .field("codec", &self.codec.is_some())
            .field("on_add", &self.on_add.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .field("register", &self.register.is_some())
            .finish()
    }
}

impl<K, V> CacheConfig<K, V> {
    /// Capacity as a plain count, 0 when unbounded.
    #[inline]
    pub fn capacity_or_zero(&self) -> usize {
        self.capacity.map_or(0, NonZeroUsize::get)
    }

    /// Rejects configurations that cannot produce a working cache.
    pub fn validate(&self) -> Result<()> {
        if self.expiration == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfig(
                "expiration duration must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl<K, V> CacheConfig<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Validates the configuration and builds the cache its `policy` names.
    pub fn build(self) -> Result<Box<dyn Cache<K, V>>> {
        self.validate()?;
        debug!(
            policy = %self.policy,
            capacity = self.capacity_or_zero(),
            expiration = ?self.expiration,
            codec = self.codec.is_some(),
            "building cache"
        );
        let cache: Box<dyn Cache<K, V>> = match self.policy {
            EvictionPolicy::Simple => Box::new(SimpleCache::init(self)),
            EvictionPolicy::Lru => Box::new(LruCache::init(self)),
            EvictionPolicy::Lfu => Box::new(LfuCache::init(self)),
        };
        Ok(cache)
    }
}

// Helpers shared by the cache implementations.
impl<K, V: Clone> CacheConfig<K, V> {
    #[inline]
    pub(crate) fn store(&self, value: V) -> Result<StoredValue<V>> {
        StoredValue::store(self.codec.as_ref(), value)
    }

    #[inline]
    pub(crate) fn load(&self, stored: &StoredValue<V>) -> Result<V> {
        stored.load(self.codec.as_ref())
    }

    /// Keeps a copy of `value` for the add callback, if one is configured.
    #[inline]
    pub(crate) fn echo_for_add(&self, value: &V) -> Option<V> {
        self.on_add.as_ref().map(|_| value.clone())
    }

    pub(crate) fn notify_added(&self, key: &K, echo: Option<V>) {
        if let (Some(callback), Some(value)) = (self.on_add.as_ref(), echo) {
            callback(key, &value);
        }
    }

    pub(crate) fn notify_expired(&self, key: &K, stored: &StoredValue<V>) {
        let Some(callback) = self.on_expire.as_ref() else {
            return;
        };
        match self.load(stored) {
            Ok(value) => callback(key, &value),
            Err(err) => warn!(error = %err, "expired value could not be decoded; expire callback skipped"),
        }
    }

    #[inline]
    pub(crate) fn record_lookup(&self, hit: bool) {
        if let Some(register) = self.register.as_ref() {
            register.record(hit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_default_config() {
        let config: CacheConfig<String, i32> = CacheConfig::default();
        assert!(config.capacity.is_none());
        assert!(config.expiration.is_none());
        assert_eq!(config.policy, EvictionPolicy::Simple);
        assert_eq!(config.capacity_or_zero(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_names_roundtrip() {
        for policy in [EvictionPolicy::Simple, EvictionPolicy::Lru, EvictionPolicy::Lfu] {
            assert_eq!(policy.name().parse::<EvictionPolicy>().unwrap(), policy);
            assert_eq!(policy.to_string(), policy.name());
        }
        assert_eq!(" LRU ".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = "arc".parse::<EvictionPolicy>().unwrap_err();
        assert_eq!(err, CacheError::UnsupportedPolicy("arc".to_string()));
    }

    #[test]
    fn test_zero_expiration_is_invalid() {
        let config: CacheConfig<String, i32> = CacheConfig {
            expiration: Some(Duration::ZERO),
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_shows_hook_presence() {
        let config: CacheConfig<String, i32> = CacheConfig {
            on_add: Some(Arc::new(|_: &String, _: &i32| {})),
            ..CacheConfig::default()
        };
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("on_add: true"));
        assert!(debug_str.contains("on_expire: false"));
    }

    #[test]
    fn test_notify_added_only_with_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let config: CacheConfig<String, i32> = CacheConfig {
            on_add: Some(Arc::new(move |_: &String, v: &i32| {
                seen.fetch_add(*v as usize, Ordering::SeqCst);
            })),
            ..CacheConfig::default()
        };

        let echo = config.echo_for_add(&5);
        config.notify_added(&"k".to_string(), echo);
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        let silent: CacheConfig<String, i32> = CacheConfig::default();
        assert!(silent.echo_for_add(&5).is_none());
    }

    #[test]
    fn test_build_each_policy() {
        for policy in [EvictionPolicy::Simple, EvictionPolicy::Lru, EvictionPolicy::Lfu] {
            let config: CacheConfig<String, i32> = CacheConfig {
                capacity: NonZeroUsize::new(4),
                policy,
                ..CacheConfig::default()
            };
            let cache = config.build().unwrap();
            cache.set("a".to_string(), 1).unwrap();
            assert_eq!(cache.get(&"a".to_string()).unwrap(), Some(1));
        }
    }
}
