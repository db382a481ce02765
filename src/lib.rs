//! # localcache
//!
//! An in-process, thread-safe key/value cache with lazy per-entry expiration
//! and interchangeable eviction policies behind one [`Cache`] interface.
//!
//! ## Policy Selection Guide
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 Which policy should I build?                         │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  Must memory stay under a hard entry bound?                          │
//! │        │                                                             │
//! │       No ──────────────────────────▶ ┌──────────┐                    │
//! │        │                             │  Simple  │ grows, never evicts│
//! │       Yes                            └──────────┘                    │
//! │        │                                                             │
//! │        ▼                                                             │
//! │  Are recently used keys the hot ones?                                │
//! │        │                                                             │
//! │       Yes ─────────────────────────▶ ┌──────────┐                    │
//! │        │                             │   LRU    │                    │
//! │       No (popularity is stable)      └──────────┘                    │
//! │        │                                                             │
//! │        ▼                                                             │
//! │  ┌──────────┐                                                        │
//! │  │   LFU    │                                                        │
//! │  └──────────┘                                                        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Policy | Type | Overflow response | Get | Set |
//! |--------|------|-------------------|-----|-----|
//! | [`EvictionPolicy::Simple`] | [`SimpleCache`] | reclaim expired, then double capacity | O(1) | O(1) amortized |
//! | [`EvictionPolicy::Lru`] | [`LruCache`] | evict least recently used | O(1) | O(1) |
//! | [`EvictionPolicy::Lfu`] | [`LfuCache`] | evict least frequently used | O(log n) | O(log n) |
//!
//! Every policy shares the same expiration model: a configured duration is
//! re-armed on each `set`, and an entry past its deadline is removed the
//! next time `get` finds it.
//!
//! ## Building a Cache
//!
//! ```rust
//! use localcache::{Cache, CacheBuilder, EvictionPolicy};
//! use std::time::Duration;
//!
//! let cache = CacheBuilder::<String, u64>::new()
//!     .policy(EvictionPolicy::Lru)
//!     .capacity(1_000)
//!     .expiration(Duration::from_secs(60))
//!     .on_add(|key, value| println!("cached {key} = {value}"))
//!     .build()
//!     .unwrap();
//!
//! cache.set("answer".to_string(), 42).unwrap();
//! assert_eq!(cache.get(&"answer".to_string()).unwrap(), Some(42));
//! assert!(cache.has(&"answer".to_string()));
//! ```
//!
//! The built cache is a `Box<dyn Cache<K, V>>`. It is `Send + Sync`, so wrap it
//! in an `Arc` to share it between threads.
//!
//! ## Direct Construction
//!
//! Each policy type can also be created from a [`CacheConfig`], which keeps
//! policy-specific helpers such as [`SimpleCache::capacity`] or
//! [`LfuCache::frequency`] available:
//!
//! ```rust
//! use localcache::{Cache, CacheConfig, SimpleCache};
//! use core::num::NonZeroUsize;
//!
//! let cache: SimpleCache<u32, &str> = SimpleCache::init(CacheConfig {
//!     capacity: NonZeroUsize::new(2),
//!     ..CacheConfig::default()
//! });
//! cache.set(1, "one").unwrap();
//! cache.set(2, "two").unwrap();
//! assert_eq!(cache.capacity(), 4); // grew instead of evicting
//! ```
//!
//! ## Codecs
//!
//! With a serializer/deserializer pair configured, values are stored as bytes
//! and decoded on every read. [`codec::json`] provides one for any `serde`
//! type:
//!
//! ```rust
//! use localcache::{codec, Cache, CacheBuilder};
//!
//! let cache = CacheBuilder::<String, Vec<String>>::new()
//!     .codec(codec::json())
//!     .build()
//!     .unwrap();
//!
//! cache.set("tags".to_string(), vec!["a".to_string()]).unwrap();
//! assert_eq!(cache.get(&"tags".to_string()).unwrap(), Some(vec!["a".to_string()]));
//! ```
//!
//! ## Hit/Miss Accounting
//!
//! A [`Register`] can be attached to any number of caches; each `get` records
//! a hit when it produces a value and a miss otherwise.
//!
//! ```rust
//! use localcache::{Cache, CacheBuilder, Register};
//! use std::sync::Arc;
//!
//! let register = Arc::new(Register::new());
//! let cache = CacheBuilder::<&str, i32>::new()
//!     .register(Arc::clone(&register))
//!     .build()
//!     .unwrap();
//!
//! cache.set("a", 1).unwrap();
//! cache.get(&"a").unwrap();
//! cache.get(&"b").unwrap();
//! assert_eq!(register.total_count(), 2);
//! assert_eq!(register.hit_rate(), 0.5);
//! ```
//!
//! ## Modules
//!
//! - [`simple`]: unordered-scan cache that grows instead of evicting
//! - [`lru`]: least recently used cache
//! - [`lfu`]: least frequently used cache
//! - [`heap`]: indexed weighted priority queue backing the LFU cache
//! - [`config`]: configuration struct, policy selector and builder
//! - [`codec`]: serializer/deserializer pairs
//! - [`metrics`]: hit/miss register and metrics reporting
//! - [`error`]: error types

/// Error types returned by cache operations and codecs.
pub mod error;

/// The uniform cache interface.
pub mod traits;

/// Cache configuration and builder.
///
/// Provides the configuration struct shared by all policies, the policy
/// selector and the chained builder.
pub mod config;

/// Serializer/deserializer pairs applied around storage.
pub mod codec;

/// Expiring entry shared by every table.
pub(crate) mod entry;

/// Doubly linked list backing the LRU order.
///
/// **Note**: internal infrastructure exposing raw pointer operations. Use the
/// cache types instead.
pub(crate) mod list;

/// Indexed min-heap keyed by integer weight.
pub mod heap;

/// Unordered-scan cache implementation.
///
/// Never evicts live entries: reclaims expired ones and otherwise grows.
pub mod simple;

/// Least Recently Used (LRU) cache implementation.
///
/// Evicts the least recently touched entry when a new key exceeds capacity.
pub mod lru;

/// Least Frequently Used (LFU) cache implementation.
///
/// Evicts the entry with the lowest access count when a new key arrives at a
/// full table.
pub mod lfu;

/// Cache metrics system.
///
/// Provides the hit/miss register and the reporting trait every cache
/// implements.
pub mod metrics;

pub use config::{CacheBuilder, CacheConfig, EvictionPolicy};
pub use error::{CacheError, CodecError, Result};
pub use heap::PriorityQueue;
pub use lfu::LfuCache;
pub use lru::LruCache;
pub use metrics::{CacheMetrics, Register};
pub use simple::SimpleCache;
pub use traits::Cache;
