//! Concurrent Cache Correctness Tests
//!
//! These tests validate that every policy keeps its invariants while being
//! accessed from many threads at once.
//!
//! ## Segments
//!
//! 1. **Lost writes**: N threads setting N distinct keys leave N keys behind,
//!    and rewriting an expired key is never undone by a racing read
//! 2. **Bounds under contention**: bounded policies never exceed capacity
//! 3. **Shared collaborators**: registers and callbacks see every event

use localcache::metrics::CacheMetrics;
use localcache::{Cache, CacheBuilder, CacheConfig, EvictionPolicy, LruCache, Register};
use scoped_threadpool::Pool;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NUM_THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

const ALL_POLICIES: [EvictionPolicy; 3] = [
    EvictionPolicy::Simple,
    EvictionPolicy::Lru,
    EvictionPolicy::Lfu,
];

fn shared_cache(policy: EvictionPolicy, cap: usize) -> Arc<dyn Cache<String, usize>> {
    let cache = CacheBuilder::<String, usize>::new()
        .policy(policy)
        .capacity(cap)
        .build()
        .unwrap();
    Arc::from(cache)
}

// ============================================================================
// SEGMENT 1: NO LOST WRITES
// ============================================================================

#[test]
fn test_distinct_keys_from_many_threads_all_land() {
    for policy in ALL_POLICIES {
        let cache = shared_cache(policy, 0);
        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.set(format!("thread-{t}"), t))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(cache.key_count(), NUM_THREADS, "{policy}");
        for t in 0..NUM_THREADS {
            assert_eq!(cache.get(&format!("thread-{t}")).unwrap(), Some(t), "{policy}");
        }
    }
}

#[test]
fn test_many_keys_per_thread_with_scoped_pool() {
    for policy in ALL_POLICIES {
        let cache = CacheBuilder::<String, usize>::new()
            .policy(policy)
            .build()
            .unwrap();
        let mut pool = Pool::new(NUM_THREADS as u32);

        pool.scoped(|scope| {
            for t in 0..NUM_THREADS {
                let cache = &cache;
                scope.execute(move || {
                    for i in 0..100 {
                        cache.set(format!("{t}:{i}"), i).unwrap();
                    }
                });
            }
        });

        assert_eq!(cache.key_count(), NUM_THREADS * 100, "{policy}");
        assert_eq!(cache.get_all().unwrap().len(), NUM_THREADS * 100, "{policy}");
    }
}

#[test]
fn test_set_on_expired_key_survives_concurrent_reads() {
    for policy in ALL_POLICIES {
        let cache: Arc<dyn Cache<String, usize>> = Arc::from(
            CacheBuilder::<String, usize>::new()
                .policy(policy)
                .capacity(8)
                .expiration(Duration::from_millis(20))
                .build()
                .unwrap(),
        );
        let done = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        cache.get(&"k".to_string()).unwrap();
                    }
                })
            })
            .collect();

        // Each round lets the previous value expire so readers race the rewrite.
        for round in 0..15 {
            cache.set("k".to_string(), round).unwrap();
            assert!(cache.has(&"k".to_string()), "{policy}: set lost in round {round}");
            thread::sleep(Duration::from_millis(25));
        }
        done.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
    }
}

#[test]
fn test_simple_growth_under_concurrent_inserts() {
    let cache = Arc::new(localcache::SimpleCache::<usize, usize>::init(CacheConfig {
        capacity: NonZeroUsize::new(4),
        ..CacheConfig::default()
    }));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..250 {
                    cache.set(t * 1_000 + i, i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let len = cache.key_count();
    assert_eq!(len, NUM_THREADS * 250);
    // Growth keeps occupancy at or under three quarters of capacity.
    assert!(len <= cache.capacity() / 4 * 3 + cache.capacity() % 4 * 3 / 4);
}

// ============================================================================
// SEGMENT 2: BOUNDS UNDER CONTENTION
// ============================================================================

#[test]
fn test_bounded_policies_respect_capacity_under_contention() {
    for policy in [EvictionPolicy::Lru, EvictionPolicy::Lfu] {
        let cache = shared_cache(policy, 64);
        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..OPS_PER_THREAD {
                        let key = format!("{}", (t * 7 + i) % 500);
                        if i % 3 == 0 {
                            let _ = cache.get(&key).unwrap();
                        } else {
                            cache.set(key, i).unwrap();
                        }
                        assert!(cache.key_count() <= 64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.key_count() <= 64, "{policy}");
    }
}

#[test]
fn test_mixed_operations_do_not_deadlock() {
    for policy in ALL_POLICIES {
        let cache: Arc<dyn Cache<String, usize>> = Arc::from(
            CacheBuilder::<String, usize>::new()
                .policy(policy)
                .capacity(32)
                .expiration(Duration::from_millis(5))
                .build()
                .unwrap(),
        );
        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..OPS_PER_THREAD / 4 {
                        let key = format!("{}", (t + i) % 40);
                        match i % 5 {
                            0 => {
                                cache.remove(&key);
                            }
                            1 => {
                                cache.get_all().unwrap();
                            }
                            2 => {
                                cache.has(&key);
                            }
                            3 => {
                                cache.get(&key).unwrap();
                            }
                            _ => cache.set(key, i).unwrap(),
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

#[test]
fn test_lru_eviction_count_matches_overflow() {
    let cache = Arc::new(LruCache::<usize, usize>::init(CacheConfig {
        capacity: NonZeroUsize::new(10),
        ..CacheConfig::default()
    }));
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..50 {
                    cache.set(t * 100 + i, i).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.key_count(), 10);
    let evictions = cache.metrics()["evictions"] as usize;
    assert_eq!(evictions, NUM_THREADS * 50 - 10);
}

// ============================================================================
// SEGMENT 3: SHARED COLLABORATORS
// ============================================================================

#[test]
fn test_shared_register_counts_every_lookup() {
    let register = Arc::new(Register::new());
    let caches: Vec<Arc<dyn Cache<String, usize>>> = ALL_POLICIES
        .iter()
        .map(|&policy| {
            Arc::from(
                CacheBuilder::<String, usize>::new()
                    .policy(policy)
                    .register(Arc::clone(&register))
                    .build()
                    .unwrap(),
            )
        })
        .collect();
    for cache in &caches {
        cache.set("present".to_string(), 1).unwrap();
    }

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let caches = caches.clone();
            thread::spawn(move || {
                for i in 0..300 {
                    let cache = &caches[(t + i) % caches.len()];
                    let key = if i % 2 == 0 { "present" } else { "absent" };
                    cache.get(&key.to_string()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(register.hit_count(), (NUM_THREADS * 150) as u64);
    assert_eq!(register.miss_count(), (NUM_THREADS * 150) as u64);
    assert_eq!(register.total_count(), (NUM_THREADS * 300) as u64);
}

#[test]
fn test_add_callback_runs_once_per_set() {
    for policy in ALL_POLICIES {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache: Arc<dyn Cache<usize, usize>> = Arc::from(
            CacheBuilder::<usize, usize>::new()
                .policy(policy)
                .capacity(16)
                .on_add(move |_, _| {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(t * 100 + i, i).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::Relaxed), NUM_THREADS * 100, "{policy}");
    }
}
