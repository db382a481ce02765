//! Hit/Miss Register
//!
//! Two independent, monotonically increasing counters updated with lock-free
//! atomic adds. A register owns no cache data and can be shared across any
//! number of caches and threads through an `Arc`.
//!
//! ```
//! use localcache::metrics::Register;
//!
//! let register = Register::new();
//! register.increment_hit();
//! register.increment_hit();
//! register.increment_miss();
//!
//! assert_eq!(register.total_count(), 3);
//! assert!((register.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
//! assert!((register.miss_rate() - 1.0 / 3.0).abs() < f64::EPSILON);
//! ```

use super::CacheMetrics;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared hit/miss counters.
#[derive(Debug, Default)]
pub struct Register {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Register {
    /// Creates a register with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit and returns the post-increment hit count.
    pub fn increment_hit(&self) -> u64 {
        self.hits.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records a miss and returns the post-increment miss count.
    pub fn increment_miss(&self) -> u64 {
        self.misses.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Records the outcome of one lookup.
    #[inline]
    pub fn record(&self, hit: bool) {
        if hit {
            self.increment_hit();
        } else {
            self.increment_miss();
        }
    }

    /// Number of hits recorded so far.
    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of misses recorded so far.
    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hits plus misses.
    pub fn total_count(&self) -> u64 {
        self.hit_count() + self.miss_count()
    }

    /// Fraction of lookups that hit, in `[0, 1]`; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let (hits, misses) = (self.hit_count(), self.miss_count());
        ratio(hits, hits + misses)
    }

    /// Fraction of lookups that missed, in `[0, 1]`; 0.0 before any lookup.
    pub fn miss_rate(&self) -> f64 {
        let (hits, misses) = (self.hit_count(), self.miss_count());
        ratio(misses, hits + misses)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl CacheMetrics for Register {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("hits".to_string(), self.hit_count() as f64);
        metrics.insert("misses".to_string(), self.miss_count() as f64);
        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "REGISTER"
    }
}
