//! Cache Metrics System
//!
//! Provides the metrics reporting surface shared by every cache policy.
//!
//! - [`Register`]: the hit/miss register. Attach one to a cache through the
//!   builder and every `get` records a hit or a miss. One register may be
//!   shared by any number of caches.
//! - [`EngineCounters`]: structural counters each cache keeps for itself
//!   (evictions, lazy expirations, capacity growths).
//! - [`CacheMetrics`]: the uniform reporting trait.
//!
//! # Why BTreeMap over HashMap?
//!
//! Metrics always appear in consistent order, which keeps test assertions and
//! log output reproducible. The cost is irrelevant at a dozen keys.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod register;

pub use register::Register;

/// Structural counters maintained by a cache instance.
///
/// All counters are monotonically increasing and updated with relaxed
/// atomics; they carry no ordering obligations towards the table.
#[derive(Debug, Default)]
pub struct EngineCounters {
    evictions: AtomicU64,
    expirations: AtomicU64,
    growths: AtomicU64,
}

impl EngineCounters {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records entries forcibly removed to honour a capacity bound.
    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    /// Records entries removed because their deadline passed.
    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    /// Records one capacity doubling.
    pub fn record_growth(&self) {
        self.growths.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of capacity evictions so far.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Number of expired entries removed so far.
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Number of capacity doublings so far.
    pub fn growths(&self) -> u64 {
        self.growths.load(Ordering::Relaxed)
    }

    /// Converts the counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("evictions".to_string(), self.evictions() as f64);
        metrics.insert("expirations".to_string(), self.expirations() as f64);
        metrics.insert("growths".to_string(), self.growths() as f64);
        metrics
    }
}

/// Trait that all cache policies implement for metrics reporting.
///
/// The trait uses BTreeMap to ensure deterministic ordering of metrics.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    ///
    /// Caches report `len`, `capacity` (0 when unbounded) and their
    /// [`EngineCounters`]; when a register is attached its `hits`, `misses`,
    /// `hit_rate` and `miss_rate` are merged in.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification (e.g. "SIMPLE", "LRU", "LFU").
    fn algorithm_name(&self) -> &'static str;
}

/// Assembles the metric map common to every cache policy.
pub(crate) fn cache_report(
    len: usize,
    capacity: usize,
    counters: &EngineCounters,
    register: Option<&Register>,
) -> BTreeMap<String, f64> {
    let mut metrics = counters.to_btreemap();
    metrics.insert("len".to_string(), len as f64);
    metrics.insert("capacity".to_string(), capacity as f64);
    if let Some(register) = register {
        metrics.extend(register.metrics());
    }
    metrics
}
