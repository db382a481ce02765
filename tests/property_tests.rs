//! Property tests driving every policy with random operation sequences.

use localcache::{Cache, CacheConfig, LfuCache, LruCache, SimpleCache};
use proptest::prelude::*;
use std::collections::HashSet;
use std::num::NonZeroUsize;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..24, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        2 => (0u8..24).prop_map(Op::Get),
        1 => (0u8..24).prop_map(Op::Remove),
    ]
}

fn bounded<K, V>(cap: usize) -> CacheConfig<K, V> {
    CacheConfig {
        capacity: NonZeroUsize::new(cap),
        ..CacheConfig::default()
    }
}

/// Recency list with the most recently used key first.
struct LruModel {
    cap: usize,
    order: Vec<u8>,
}

impl LruModel {
    fn touch(&mut self, key: u8) -> bool {
        match self.order.iter().position(|&k| k == key) {
            Some(pos) => {
                self.order.remove(pos);
                self.order.insert(0, key);
                true
            }
            None => false,
        }
    }

    fn set(&mut self, key: u8) {
        if !self.touch(key) {
            self.order.insert(0, key);
            if self.order.len() > self.cap {
                self.order.pop();
            }
        }
    }

    fn remove(&mut self, key: u8) -> bool {
        match self.order.iter().position(|&k| k == key) {
            Some(pos) => {
                self.order.remove(pos);
                true
            }
            None => false,
        }
    }
}

proptest! {
    #[test]
    fn prop_lru_matches_recency_model(
        cap in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let cache: LruCache<u8, u32> = LruCache::init(bounded(cap));
        let mut model = LruModel { cap, order: Vec::new() };

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    cache.set(k, v).unwrap();
                    model.set(k);
                    prop_assert_eq!(cache.get(&k).unwrap(), Some(v));
                    model.touch(k);
                }
                Op::Get(k) => {
                    let hit = cache.get(&k).unwrap().is_some();
                    prop_assert_eq!(hit, model.touch(k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(cache.remove(&k), model.remove(k));
                }
            }
            prop_assert_eq!(cache.key_count(), model.order.len());
        }

        for k in 0u8..24 {
            prop_assert_eq!(cache.has(&k), model.order.contains(&k));
        }
    }

    #[test]
    fn prop_lfu_never_exceeds_capacity(
        cap in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let cache: LfuCache<u8, u32> = LfuCache::init(bounded(cap));

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    cache.set(k, v).unwrap();
                    // The newest key is never the one evicted by its own insert.
                    prop_assert_eq!(cache.get(&k).unwrap(), Some(v));
                }
                Op::Get(k) => {
                    let _ = cache.get(&k).unwrap();
                }
                Op::Remove(k) => {
                    cache.remove(&k);
                }
            }
            prop_assert!(cache.key_count() <= cap);
            prop_assert_eq!(cache.get_all().unwrap().len(), cache.key_count());
        }
    }

    #[test]
    fn prop_simple_never_loses_live_keys(
        cap in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 0..200),
    ) {
        let cache: SimpleCache<u8, u32> = SimpleCache::init(bounded(cap));
        let mut live = HashSet::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    cache.set(k, v).unwrap();
                    live.insert(k);
                }
                Op::Get(k) => {
                    prop_assert_eq!(cache.get(&k).unwrap().is_some(), live.contains(&k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(cache.remove(&k), live.remove(&k));
                }
            }
            prop_assert_eq!(cache.key_count(), live.len());
            prop_assert!(cache.capacity() >= cap);
        }
    }
}
