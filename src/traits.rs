//! The uniform cache interface.
//!
//! Every policy ([`SimpleCache`](crate::SimpleCache), [`LruCache`](crate::LruCache),
//! [`LfuCache`](crate::LfuCache)) implements [`Cache`], and
//! [`CacheBuilder::build`](crate::CacheBuilder::build) hands one back as a
//! trait object. All methods take `&self`: caches synchronize internally and
//! are meant to be shared across threads behind an `Arc`.
//!
//! # Conventions
//!
//! | Operation | Absent key | Expired key | Errors |
//! |-----------|------------|-------------|--------|
//! | `set`     | inserts    | rewrites, re-arms ttl | serializer failure |
//! | `get`     | `Ok(None)` | `Ok(None)`, entry removed, expire callback fired | deserializer failure |
//! | `remove`  | `false`    | `true` (slot removed) | never |
//! | `has`     | `false`    | `false` | never |

use crate::error::Result;
use std::collections::HashMap;

/// Operations shared by every cache policy.
pub trait Cache<K, V>: Send + Sync {
    /// Stores `value` under `key`, re-arming the expiration deadline.
    ///
    /// Fails only if the configured serializer fails, in which case nothing
    /// is written and no callback fires.
    fn set(&self, key: K, value: V) -> Result<()>;

    /// Returns the live value for `key`, or `Ok(None)` if absent or expired.
    ///
    /// Expired entries found here are removed and reported to the expire
    /// callback. An attached register records a hit for `Some` and a miss
    /// otherwise.
    fn get(&self, key: &K) -> Result<Option<V>>;

    /// Deletes `key`, returning whether a slot was removed.
    fn remove(&self, key: &K) -> bool;

    /// Snapshot of every non-expired entry.
    ///
    /// Consistency is best-effort: entries may expire or change between the
    /// snapshot and the caller's use of it.
    fn get_all(&self) -> Result<HashMap<K, V>>;

    /// Number of slots currently in the table, expired-but-undiscovered
    /// entries included.
    fn key_count(&self) -> usize;

    /// Returns `true` if `key` is present and not expired.
    fn has(&self, key: &K) -> bool;
}
