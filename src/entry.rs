//! Expiring Cache Entry
//!
//! The unit of storage shared by every cache policy: a stored value plus an
//! optional absolute expiration instant, guarded by the entry's own lock.
//!
//! # Locking
//!
//! Tables hold entries behind `Arc` so readers can copy a value out under the
//! entry lock alone. A rewrite of an existing slot takes the entry lock while
//! the table lock (shared, for the unordered table) is still held, so a reader
//! can never drop the slot on the deadline the rewrite is replacing. Lock order
//! is always table then entry; no code path acquires a table lock while
//! holding an entry lock.
//!
//! # Expiration
//!
//! Expiry is lazy. Nothing wakes up when a deadline passes; callers compare
//! the deadline with the current instant on read. An entry is expired once
//! `now >= expires_at`. A ttl so large that the deadline overflows `Instant`
//! is treated as "never expires".

use crate::codec::StoredValue;
use parking_lot::RwLock;
use std::fmt;
use std::time::{Duration, Instant};

/// Value and deadline, mutated only under the entry lock.
#[derive(Debug, Clone)]
struct EntryState<V> {
    value: StoredValue<V>,
    expires_at: Option<Instant>,
}

/// Outcome of reading an entry at a given instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryRead<V> {
    /// The entry is live; carries a copy of its stored value.
    Live(StoredValue<V>),
    /// The deadline has passed; carries the value it held.
    Expired(StoredValue<V>),
}

/// A stored value with an optional expiration instant and its own lock.
pub(crate) struct ExpiringEntry<V> {
    state: RwLock<EntryState<V>>,
}

impl<V: Clone> ExpiringEntry<V> {
    /// Creates an entry; `ttl` of `None` means it never expires.
    pub(crate) fn new(value: StoredValue<V>, ttl: Option<Duration>) -> Self {
        Self {
            state: RwLock::new(EntryState {
                value,
                expires_at: deadline(ttl),
            }),
        }
    }

    /// Replaces the value and re-arms the deadline from now.
    pub(crate) fn write(&self, value: StoredValue<V>, ttl: Option<Duration>) {
        let mut state = self.state.write();
        state.value = value;
        state.expires_at = deadline(ttl);
    }

    /// Reads the value, classifying it against `now`.
    pub(crate) fn read(&self, now: Instant) -> EntryRead<V> {
        let state = self.state.read();
        if is_past(state.expires_at, now) {
            EntryRead::Expired(state.value.clone())
        } else {
            EntryRead::Live(state.value.clone())
        }
    }

    /// Returns the stored value if the entry is live at `now`.
    pub(crate) fn live_value(&self, now: Instant) -> Option<StoredValue<V>> {
        match self.read(now) {
            EntryRead::Live(value) => Some(value),
            EntryRead::Expired(_) => None,
        }
    }

    /// Returns `true` once the deadline has passed.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        is_past(self.state.read().expires_at, now)
    }

    /// The absolute expiration instant, if any.
    #[cfg(test)]
    pub(crate) fn expires_at(&self) -> Option<Instant> {
        self.state.read().expires_at
    }

    /// Time left before expiry; `Some(ZERO)` when already expired.
    #[cfg(test)]
    pub(crate) fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.state
            .read()
            .expires_at
            .map(|at| at.saturating_duration_since(now))
    }
}

impl<V> fmt::Debug for ExpiringEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringEntry")
            .field("expires_at", &self.state.read().expires_at)
            .finish_non_exhaustive()
    }
}

fn deadline(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}

fn is_past(expires_at: Option<Instant>, now: Instant) -> bool {
    matches!(expires_at, Some(at) if now >= at)
}
