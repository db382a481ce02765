//! Chained cache builder.
//!
//! ```
//! use localcache::{Cache, CacheBuilder, EvictionPolicy};
//! use localcache::metrics::Register;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let register = Arc::new(Register::new());
//! let cache = CacheBuilder::<String, String>::new()
//!     .policy(EvictionPolicy::Lru)
//!     .capacity(2)
//!     .expiration(Duration::from_secs(30))
//!     .register(Arc::clone(&register))
//!     .build()
//!     .unwrap();
//!
//! cache.set("a".to_string(), "alpha".to_string()).unwrap();
//! assert_eq!(cache.get(&"a".to_string()).unwrap().as_deref(), Some("alpha"));
//! assert_eq!(cache.get(&"b".to_string()).unwrap(), None);
//! assert_eq!((register.hit_count(), register.miss_count()), (1, 1));
//! ```

use super::{AddCallback, CacheConfig, EvictionPolicy, ExpireCallback};
use crate::codec::{Codec, DeserializeFn, SerializeFn};
use crate::error::{CacheError, CodecError, Result};
use crate::metrics::Register;
use crate::traits::Cache;
use core::fmt;
use core::hash::Hash;
use core::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

/// Policy as requested by the caller; names are resolved at build time.
#[derive(Debug, Clone)]
enum PolicySelection {
    Known(EvictionPolicy),
    Named(String),
}

/// Accumulates options and produces a configured cache.
///
/// Defaults: unbounded, no expiration, [`EvictionPolicy::Simple`], no codec,
/// no callbacks, no register.
pub struct CacheBuilder<K, V> {
    capacity: usize,
    expiration: Option<Duration>,
    policy: PolicySelection,
    serializer: Option<SerializeFn<V>>,
    deserializer: Option<DeserializeFn<V>>,
    on_add: Option<AddCallback<K, V>>,
    on_expire: Option<ExpireCallback<K, V>>,
    register: Option<Arc<Register>>,
}

impl<K, V> Default for CacheBuilder<K, V> {
    fn default() -> Self {
        Self {
            capacity: 0,
            expiration: None,
            policy: PolicySelection::Known(EvictionPolicy::default()),
            serializer: None,
            deserializer: None,
            on_add: None,
            on_expire: None,
            register: None,
        }
    }
}

impl<K, V> CacheBuilder<K, V> {
    /// Creates a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of entries; 0 means unbounded.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Time-to-live re-armed on every write.
    pub fn expiration(mut self, ttl: Duration) -> Self {
        self.expiration = Some(ttl);
        self
    }

    /// Selects the eviction policy.
    pub fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = PolicySelection::Known(policy);
        self
    }

    /// Selects the eviction policy by name; unknown names fail in `build`.
    pub fn policy_name(mut self, name: impl Into<String>) -> Self {
        self.policy = PolicySelection::Named(name.into());
        self
    }

    /// Serializer applied on `set`; must be paired with a deserializer.
    pub fn serializer<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&V) -> std::result::Result<Vec<u8>, CodecError> + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serialize));
        self
    }

    /// Deserializer applied on `get`; must be paired with a serializer.
    pub fn deserializer<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&[u8]) -> std::result::Result<V, CodecError> + Send + Sync + 'static,
    {
        self.deserializer = Some(Arc::new(deserialize));
        self
    }

    /// Sets both codec hooks at once.
    pub fn codec(mut self, codec: Codec<V>) -> Self {
        let (serialize, deserialize) = codec.into_parts();
        self.serializer = Some(serialize);
        self.deserializer = Some(deserialize);
        self
    }

    /// Callback fired with `(key, value)` after each successful `set`.
    pub fn on_add<F>(mut self, callback: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_add = Some(Arc::new(callback));
        self
    }

    /// Callback fired with `(key, value)` when `get` finds an expired entry.
    pub fn on_expire<F>(mut self, callback: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_expire = Some(Arc::new(callback));
        self
    }

    /// Attaches a hit/miss register, possibly shared with other caches.
    pub fn register(mut self, register: Arc<Register>) -> Self {
        self.register = Some(register);
        self
    }

    /// Resolves and validates the options into a [`CacheConfig`].
    pub fn into_config(self) -> Result<CacheConfig<K, V>> {
        let policy = match self.policy {
            PolicySelection::Known(policy) => policy,
            PolicySelection::Named(name) => name.parse()?,
        };
        let codec = match (self.serializer, self.deserializer) {
            (Some(serialize), Some(deserialize)) => Some(Codec::from_parts(serialize, deserialize)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CacheError::InvalidConfig(
                    "serializer configured without a deserializer".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(CacheError::InvalidConfig(
                    "deserializer configured without a serializer".to_string(),
                ))
            }
        };
        let config = CacheConfig {
            capacity: NonZeroUsize::new(self.capacity),
            expiration: self.expiration,
            policy,
            codec,
            on_add: self.on_add,
            on_expire: self.on_expire,
            register: self.register,
        };
        config.validate()?;
        Ok(config)
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Builds the cache selected by the policy.
    ///
    /// Fails with [`CacheError::UnsupportedPolicy`] for an unknown policy
    /// name and [`CacheError::InvalidConfig`] for an unpaired codec or a zero
    /// expiration.
    pub fn build(self) -> Result<Box<dyn Cache<K, V>>> {
        self.into_config()?.build()
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("expiration", &self.expiration)
            .field("policy", &self.policy)
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .field("on_add", &self.on_add.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .field("register", &self.register.is_some())
            .finish()
    }
}
